use crate::error::Result;
use crate::pipeline::normalize::NormalizedRecord;
use crate::types::StatementKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Collects one company's normalized records (in discovery order) and
/// partitions them into the three statement tables.
///
/// Sorting happens once, after all records are collected; the sort key is
/// the structured `(year, quarter)` pair of the period token. The sort is
/// stable, so two filings covering the same quarter keep their discovery
/// order and both appear in the output (no deduplication by period).
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<NormalizedRecord>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort by period and partition into the three statement tables
    pub fn into_tables(mut self) -> Vec<StatementTable> {
        self.records.sort_by_key(|r| r.period);
        StatementKind::ALL
            .iter()
            .map(|kind| StatementTable::build(*kind, &self.records))
            .collect()
    }
}

/// Records qualifying for one statement kind, already sorted by period
#[derive(Debug)]
pub struct StatementTable {
    pub kind: StatementKind,
    pub rows: Vec<NormalizedRecord>,
}

impl StatementTable {
    /// Filter sorted records down to those populating at least one of this
    /// kind's fields. Projection to the kind's field list happens at write
    /// time; fields of other kinds are simply not written.
    fn build(kind: StatementKind, sorted_records: &[NormalizedRecord]) -> Self {
        let rows = sorted_records
            .iter()
            .filter(|r| r.has_any_of(kind.fields()))
            .cloned()
            .collect();
        Self { kind, rows }
    }

    /// Write `<COMPANY>_<kind>_quarterly.csv` into `output_dir`.
    ///
    /// Returns the written path, or `None` when the table has no qualifying
    /// rows (skipped with a warning, never an error). Numeric cells carry
    /// exactly two fractional digits; unpopulated cells are left empty.
    pub fn write_csv(&self, company: &str, output_dir: &Path) -> Result<Option<PathBuf>> {
        if self.rows.is_empty() {
            warn!("No data for {} {}", company, self.kind.code().to_uppercase());
            return Ok(None);
        }

        let output_path = output_dir.join(format!("{}_{}_quarterly.csv", company, self.kind.code()));
        let mut writer = csv::Writer::from_path(&output_path)?;

        let mut header = vec!["company", "period", "date"];
        header.extend(self.kind.fields().iter().map(|f| f.as_str()));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.company.clone(),
                row.period.to_string(),
                row.date.clone(),
            ];
            for field in self.kind.fields() {
                record.push(match row.fields.get(field) {
                    Some(value) => {
                        let mut cell = *value;
                        cell.rescale(2);
                        cell.to_string()
                    }
                    None => String::new(),
                });
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!(
            "Created: {} ({} rows)",
            output_path.display(),
            self.rows.len()
        );
        Ok(Some(output_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::period::PeriodToken;
    use crate::types::CanonicalField;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn record(period: &str, fields: &[(CanonicalField, &str)]) -> NormalizedRecord {
        let period: PeriodToken = period.parse().unwrap();
        NormalizedRecord {
            company: "TEPCO".to_string(),
            period,
            date: "2025-09-30".to_string(),
            fields: fields
                .iter()
                .map(|(f, v)| (*f, Decimal::from_str(v).unwrap()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn sorts_by_structured_period_key() {
        let mut agg = Aggregator::new();
        for period in ["2025Q1", "2024Q4", "2025Q2"] {
            agg.push(record(period, &[(CanonicalField::Revenue, "1.00")]));
        }
        let tables = agg.into_tables();
        let pl = &tables[0];
        let periods: Vec<String> = pl.rows.iter().map(|r| r.period.to_string()).collect();
        assert_eq!(periods, ["2024Q4", "2025Q1", "2025Q2"]);
    }

    #[test]
    fn partitions_records_by_statement_fields() {
        let mut agg = Aggregator::new();
        agg.push(record("2025Q1", &[(CanonicalField::Revenue, "1.00")]));
        agg.push(record("2025Q1", &[(CanonicalField::TotalAssets, "140.00")]));
        agg.push(record("2025Q1", &[(CanonicalField::OperatingCf, "8.00")]));
        // A record spanning two statements appears in both tables
        agg.push(record(
            "2025Q2",
            &[
                (CanonicalField::Revenue, "2.00"),
                (CanonicalField::NetAssets, "40.00"),
            ],
        ));

        let tables = agg.into_tables();
        assert_eq!(tables[0].rows.len(), 2); // pl
        assert_eq!(tables[1].rows.len(), 2); // bs
        assert_eq!(tables[2].rows.len(), 1); // cf
    }

    #[test]
    fn duplicate_periods_are_both_retained() {
        let mut agg = Aggregator::new();
        agg.push(record("2025Q1", &[(CanonicalField::Revenue, "1.00")]));
        agg.push(record("2025Q1", &[(CanonicalField::Revenue, "2.00")]));
        let tables = agg.into_tables();
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn writes_header_and_two_digit_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = Aggregator::new();
        agg.push(record(
            "2025Q2",
            &[
                (CanonicalField::Revenue, "150.5"),
                (CanonicalField::NetIncome, "1"),
            ],
        ));
        let tables = agg.into_tables();
        let path = tables[0].write_csv("TEPCO", dir.path()).unwrap().unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "company,period,date,revenue,operating_income,ordinary_income,net_income"
        );
        assert_eq!(
            lines.next().unwrap(),
            "TEPCO,2025Q2,2025-09-30,150.50,,,1.00"
        );
    }

    #[test]
    fn empty_table_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let agg = Aggregator::new();
        let tables = agg.into_tables();
        for table in tables {
            assert!(table.write_csv("TEPCO", dir.path()).unwrap().is_none());
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
