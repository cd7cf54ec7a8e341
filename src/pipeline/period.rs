use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// A fiscal quarter, displayed as `YYYYQn`.
///
/// Ordering is by the `(year, quarter)` pair, never by the rendered string.
/// The lexicographic order of the rendered form happens to coincide today,
/// but the Q4 year-rollback in [`classify`] makes that a coincidence, not a
/// contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodToken {
    pub year: i32,
    pub quarter: u8,
}

impl fmt::Display for PeriodToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for PeriodToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, quarter) = s
            .split_once('Q')
            .ok_or_else(|| format!("invalid period token: {s}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid period year: {s}"))?;
        let quarter: u8 = quarter
            .parse()
            .map_err(|_| format!("invalid period quarter: {s}"))?;
        if !(1..=4).contains(&quarter) {
            return Err(format!("quarter out of range: {s}"));
        }
        Ok(PeriodToken { year, quarter })
    }
}

/// Classify a settlement date into its fiscal quarter.
///
/// The fiscal year starts in April, so calendar months 1-3 belong to Q4 of
/// the previous fiscal year; 4-6 are Q1, 7-9 are Q2, 10-12 are Q3.
pub fn classify(date: NaiveDate) -> PeriodToken {
    let (year, quarter) = match date.month() {
        1..=3 => (date.year() - 1, 4),
        4..=6 => (date.year(), 1),
        7..=9 => (date.year(), 2),
        _ => (date.year(), 3),
    };
    PeriodToken { year, quarter }
}

static SETTLEMENT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").unwrap());

/// Extract the settlement date embedded in a cached archive filename
/// (`<COMPANY>_<docID>_<YYYY-MM-DD>.zip`). Returns `None` when no parseable
/// calendar date is present; callers skip such documents.
pub fn parse_settlement_date(filename: &str) -> Option<NaiveDate> {
    let caps = SETTLEMENT_DATE_RE.captures(filename)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fiscal_offset_table() {
        // Months 1-3 roll back to Q4 of the previous year
        for month in 1..=3 {
            assert_eq!(
                classify(date(2025, month, 15)),
                PeriodToken { year: 2024, quarter: 4 }
            );
        }
        for month in 4..=6 {
            assert_eq!(
                classify(date(2025, month, 15)),
                PeriodToken { year: 2025, quarter: 1 }
            );
        }
        for month in 7..=9 {
            assert_eq!(
                classify(date(2025, month, 15)),
                PeriodToken { year: 2025, quarter: 2 }
            );
        }
        for month in 10..=12 {
            assert_eq!(
                classify(date(2025, month, 15)),
                PeriodToken { year: 2025, quarter: 3 }
            );
        }
    }

    #[test]
    fn classify_examples() {
        assert_eq!(classify(date(2025, 9, 30)).to_string(), "2025Q2");
        assert_eq!(classify(date(2025, 1, 15)).to_string(), "2024Q4");
    }

    #[test]
    fn ordering_uses_the_adjusted_pair() {
        let q4_2024 = classify(date(2025, 3, 31));
        let q1_2025 = classify(date(2025, 6, 30));
        assert!(q4_2024 < q1_2025);
    }

    #[test]
    fn parses_settlement_date_from_filename() {
        assert_eq!(
            parse_settlement_date("TEPCO_S100ABCD_2025-09-30.zip"),
            Some(date(2025, 9, 30))
        );
        assert_eq!(parse_settlement_date("TEPCO_S100ABCD.zip"), None);
        // A date-shaped token that is not a real calendar date is rejected
        assert_eq!(parse_settlement_date("TEPCO_S100ABCD_2025-13-01.zip"), None);
    }

    #[test]
    fn period_token_round_trip() {
        let token: PeriodToken = "2024Q4".parse().unwrap();
        assert_eq!(token, PeriodToken { year: 2024, quarter: 4 });
        assert_eq!(token.to_string(), "2024Q4");
        assert!("2024Q5".parse::<PeriodToken>().is_err());
        assert!("2024".parse::<PeriodToken>().is_err());
    }
}
