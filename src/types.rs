use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Canonical financial statement fields in the target schema.
///
/// This is a closed set: every taxonomy alias resolves to one of these, and
/// the statement tables are built from fixed subsets of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Revenue,
    OperatingIncome,
    OrdinaryIncome,
    NetIncome,
    TotalAssets,
    CurrentAssets,
    FixedAssets,
    TotalLiabilities,
    NetAssets,
    OperatingCf,
    InvestingCf,
    FinancingCf,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Revenue,
        CanonicalField::OperatingIncome,
        CanonicalField::OrdinaryIncome,
        CanonicalField::NetIncome,
        CanonicalField::TotalAssets,
        CanonicalField::CurrentAssets,
        CanonicalField::FixedAssets,
        CanonicalField::TotalLiabilities,
        CanonicalField::NetAssets,
        CanonicalField::OperatingCf,
        CanonicalField::InvestingCf,
        CanonicalField::FinancingCf,
    ];

    /// The schema name of this field, as it appears in headers and the
    /// taxonomy map
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Revenue => "revenue",
            CanonicalField::OperatingIncome => "operating_income",
            CanonicalField::OrdinaryIncome => "ordinary_income",
            CanonicalField::NetIncome => "net_income",
            CanonicalField::TotalAssets => "total_assets",
            CanonicalField::CurrentAssets => "current_assets",
            CanonicalField::FixedAssets => "fixed_assets",
            CanonicalField::TotalLiabilities => "total_liabilities",
            CanonicalField::NetAssets => "net_assets",
            CanonicalField::OperatingCf => "operating_cf",
            CanonicalField::InvestingCf => "investing_cf",
            CanonicalField::FinancingCf => "financing_cf",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalField {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or(())
    }
}

/// The three canonical statement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Income statement (profit and loss)
    Pl,
    /// Balance sheet
    Bs,
    /// Cash flow statement
    Cf,
}

impl StatementKind {
    pub const ALL: [StatementKind; 3] = [StatementKind::Pl, StatementKind::Bs, StatementKind::Cf];

    /// Short code used in output filenames
    pub fn code(&self) -> &'static str {
        match self {
            StatementKind::Pl => "pl",
            StatementKind::Bs => "bs",
            StatementKind::Cf => "cf",
        }
    }

    /// Financial fields belonging to this statement kind, in header order
    pub fn fields(&self) -> &'static [CanonicalField] {
        match self {
            StatementKind::Pl => &[
                CanonicalField::Revenue,
                CanonicalField::OperatingIncome,
                CanonicalField::OrdinaryIncome,
                CanonicalField::NetIncome,
            ],
            StatementKind::Bs => &[
                CanonicalField::TotalAssets,
                CanonicalField::CurrentAssets,
                CanonicalField::FixedAssets,
                CanonicalField::TotalLiabilities,
                CanonicalField::NetAssets,
            ],
            StatementKind::Cf => &[
                CanonicalField::OperatingCf,
                CanonicalField::InvestingCf,
                CanonicalField::FinancingCf,
            ],
        }
    }
}

/// One row lifted from a tabular document inside a filing archive: the
/// taxonomy element label and the reported amount, both as they appear in
/// the file. The amount may be absent or non-numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLineItem {
    pub label: String,
    pub amount: Option<String>,
}

/// Listing row returned by the documents API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    #[serde(rename = "docID")]
    pub doc_id: String,
    #[serde(rename = "edinetCode")]
    pub edinet_code: Option<String>,
    #[serde(rename = "periodEnd")]
    pub period_end: Option<String>,
    #[serde(rename = "docDescription")]
    pub doc_description: Option<String>,
}

/// Core trait for the remote document source, so the fetch layer can be
/// swapped for a fake in tests
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// List document descriptors filed on the given date (YYYY-MM-DD)
    async fn list_documents(&self, date: &str) -> Result<Vec<DocumentDescriptor>>;

    /// Download one document archive to `output_path`. Returns false when the
    /// document does not exist.
    async fn download_document(&self, doc_id: &str, output_path: &Path) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_field_names_round_trip() {
        for field in CanonicalField::ALL {
            assert_eq!(CanonicalField::from_str(field.as_str()), Ok(field));
        }
        assert!(CanonicalField::from_str("ebitda").is_err());
    }

    #[test]
    fn statement_kinds_partition_the_field_set() {
        let total: usize = StatementKind::ALL.iter().map(|k| k.fields().len()).sum();
        assert_eq!(total, CanonicalField::ALL.len());
    }
}
