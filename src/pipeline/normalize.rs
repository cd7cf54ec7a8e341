use crate::constants::AMOUNT_DIVISOR;
use crate::pipeline::period::PeriodToken;
use crate::pipeline::taxonomy::TaxonomyMap;
use crate::types::{CanonicalField, RawLineItem};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, warn};

/// One schema-conformant record per company-period: the three identity
/// fields plus whichever canonical financial fields the source document
/// populated. Constructed once, immutable afterwards; the aggregator takes
/// ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub company: String,
    pub period: PeriodToken,
    pub date: String,
    pub fields: BTreeMap<CanonicalField, Decimal>,
}

impl NormalizedRecord {
    /// Whether this record populates at least one field of the given list
    pub fn has_any_of(&self, fields: &[CanonicalField]) -> bool {
        fields.iter().any(|f| self.fields.contains_key(f))
    }
}

/// Normalize one extracted tabular document into a record.
///
/// Line items with an empty label or absent amount are passed over; mapped
/// amounts are scaled from thousands of yen to hundred-millions and rounded
/// to two fractional digits. An amount that fails numeric coercion drops
/// that line item with a warning and processing continues. When two line
/// items map to the same canonical field, the later one wins.
///
/// Returns `None` when no financial field was populated — such a document
/// produces no output at all.
pub fn normalize_document(
    items: &[RawLineItem],
    company: &str,
    period: PeriodToken,
    date: &str,
    taxonomy: &TaxonomyMap,
) -> Option<NormalizedRecord> {
    let divisor = Decimal::from(AMOUNT_DIVISOR);
    let mut fields: BTreeMap<CanonicalField, Decimal> = BTreeMap::new();

    for item in items {
        if item.label.is_empty() {
            continue;
        }
        let Some(amount) = item.amount.as_deref() else {
            continue;
        };
        let Some(field) = taxonomy.map_label(&item.label) else {
            continue;
        };

        match Decimal::from_str(amount.trim()) {
            Ok(value) => {
                let scaled = (value / divisor).round_dp(2);
                // Last write wins on duplicate fields within one document
                fields.insert(field, scaled);
            }
            Err(_) => {
                warn!("Invalid value for {}: {}", item.label, amount);
            }
        }
    }

    if fields.is_empty() {
        debug!("Document for {} {} had no mappable fields, discarding", company, period);
        return None;
    }

    Some(NormalizedRecord {
        company: company.to_string(),
        period,
        date: date.to_string(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(label: &str, amount: Option<&str>) -> RawLineItem {
        RawLineItem {
            label: label.to_string(),
            amount: amount.map(str::to_string),
        }
    }

    fn taxonomy() -> TaxonomyMap {
        TaxonomyMap::from_entries(
            CanonicalField::ALL
                .iter()
                .map(|f| (*f, vec![alias_for(*f).to_string()]))
                .collect(),
        )
    }

    fn alias_for(field: CanonicalField) -> &'static str {
        match field {
            CanonicalField::Revenue => "NetSales",
            CanonicalField::OperatingIncome => "OperatingIncome",
            CanonicalField::OrdinaryIncome => "OrdinaryIncome",
            CanonicalField::NetIncome => "ProfitLoss",
            CanonicalField::TotalAssets => "TotalAssets",
            CanonicalField::CurrentAssets => "CurrentAssets",
            CanonicalField::FixedAssets => "NoncurrentAssets",
            CanonicalField::TotalLiabilities => "TotalLiabilities",
            CanonicalField::NetAssets => "NetAssets",
            CanonicalField::OperatingCf => "OperatingActivities",
            CanonicalField::InvestingCf => "InvestingActivities",
            CanonicalField::FinancingCf => "FinancingActivities",
        }
    }

    fn period() -> PeriodToken {
        PeriodToken { year: 2025, quarter: 2 }
    }

    #[test]
    fn converts_thousands_to_hundred_millions_for_every_field() {
        let map = taxonomy();
        for field in CanonicalField::ALL {
            let items = [item(alias_for(field), Some("100000"))];
            let record =
                normalize_document(&items, "TEPCO", period(), "2025-09-30", &map).unwrap();
            assert_eq!(
                record.fields[&field],
                Decimal::from_str("1.00").unwrap(),
                "field {field}"
            );
        }
    }

    #[test]
    fn rounds_to_two_fractional_digits() {
        let map = taxonomy();
        let items = [item("NetSales", Some("123456"))];
        let record = normalize_document(&items, "TEPCO", period(), "2025-09-30", &map).unwrap();
        assert_eq!(
            record.fields[&CanonicalField::Revenue],
            Decimal::from_str("1.23").unwrap()
        );
    }

    #[test]
    fn negative_amounts_survive_scaling() {
        let map = taxonomy();
        let items = [item("InvestingActivities", Some("-500000"))];
        let record = normalize_document(&items, "TEPCO", period(), "2025-09-30", &map).unwrap();
        assert_eq!(
            record.fields[&CanonicalField::InvestingCf],
            Decimal::from_str("-5.00").unwrap()
        );
    }

    #[test]
    fn unmapped_and_non_numeric_document_is_discarded() {
        let map = taxonomy();
        let items = [
            item("SomethingUnrecognized", Some("100000")),
            item("NetSales", Some("not-a-number")),
            item("", Some("100000")),
            item("ProfitLoss", None),
        ];
        assert!(normalize_document(&items, "TEPCO", period(), "2025-09-30", &map).is_none());
    }

    #[test]
    fn coercion_failure_drops_only_that_line_item() {
        let map = taxonomy();
        let items = [
            item("NetSales", Some("garbage")),
            item("OperatingIncome", Some("300000")),
        ];
        let record = normalize_document(&items, "TEPCO", period(), "2025-09-30", &map).unwrap();
        assert!(!record.fields.contains_key(&CanonicalField::Revenue));
        assert_eq!(
            record.fields[&CanonicalField::OperatingIncome],
            Decimal::from_str("3.00").unwrap()
        );
    }

    #[test]
    fn later_duplicate_field_overwrites_earlier() {
        let map = taxonomy();
        let items = [
            item("NetSales", Some("100000")),
            item("NetSalesOfCompletedConstructionContracts", Some("200000")),
        ];
        let record = normalize_document(&items, "TEPCO", period(), "2025-09-30", &map).unwrap();
        assert_eq!(
            record.fields[&CanonicalField::Revenue],
            Decimal::from_str("2.00").unwrap()
        );
    }

    #[test]
    fn identity_fields_are_always_present() {
        let map = taxonomy();
        let items = [item("NetSales", Some("100000"))];
        let record = normalize_document(&items, "CHUBU", period(), "2025-09-30", &map).unwrap();
        assert_eq!(record.company, "CHUBU");
        assert_eq!(record.period.to_string(), "2025Q2");
        assert_eq!(record.date, "2025-09-30");
    }
}
