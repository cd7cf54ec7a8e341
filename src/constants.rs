/// Company codes and schema constants shared across the pipeline.

// Company codes used in cache filenames, output rows and the notes collection
pub const TEPCO: &str = "TEPCO";
pub const CHUBU: &str = "CHUBU";
pub const COMPANY_CODES: [&str; 2] = [TEPCO, CHUBU];

// Default EDINET filer codes (overridable via environment)
pub const TEPCO_EDINET_CODE: &str = "E04498";
pub const CHUBU_EDINET_CODE: &str = "E04503";

/// Schema version the notes collection must carry, compared exactly
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Source amounts are thousands of yen; emitted amounts are hundred-millions
/// (oku yen). Every mapped value is divided by this factor.
pub const AMOUNT_DIVISOR: i64 = 100_000;

// Column headers of the tabular documents inside a filing archive
pub const LABEL_COLUMN: &str = "要素名";
pub const AMOUNT_COLUMN: &str = "金額";

// Filing descriptions that identify quarterly and annual securities reports
pub const QUARTERLY_REPORT_KEYWORD: &str = "四半期報告書";
pub const ANNUAL_REPORT_KEYWORD: &str = "有価証券報告書";

/// Whether a company code belongs to the fixed two-element set
pub fn is_known_company(code: &str) -> bool {
    COMPANY_CODES.contains(&code)
}
