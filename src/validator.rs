use crate::constants::{is_known_company, COMPANY_CODES, SCHEMA_VERSION};
use crate::types::CanonicalField;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::warn;

static PERIOD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}Q[1-4]$").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

const NOTE_REQUIRED_FIELDS: [&str; 8] = [
    "company",
    "period",
    "docID",
    "category",
    "text",
    "severity",
    "keywords",
    "detected_at",
];
const NOTE_CATEGORIES: [&str; 3] = ["risk", "policy_change", "info"];

/// One schema violation: where it was found and what is wrong
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub location: String,
    pub message: String,
}

/// Accumulated validation outcome. Checks never short-circuit; the report
/// passes only when zero issues were collected across every file.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, location: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            location: location.to_string(),
            message: message.into(),
        });
    }

    fn merge(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }
}

fn is_valid_period(period: &str) -> bool {
    PERIOD_RE.is_match(period)
}

fn is_valid_date(date: &str) -> bool {
    DATE_RE.is_match(date)
}

/// Validate one emitted statement CSV against the fixed schema
pub fn validate_csv_file(path: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    let location = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = match csv::Reader::from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            report.push(&location, format!("Error reading CSV: {e}"));
            return report;
        }
    };

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            report.push(&location, format!("CSV file has no header row: {e}"));
            return report;
        }
    };

    for required in ["company", "period", "date"] {
        if !headers.iter().any(|h| h == required) {
            report.push(
                &location,
                format!("Required field '{required}' not found in CSV header"),
            );
        }
    }

    let index_of = |name: &str| headers.iter().position(|h| h == name);
    let company_index = index_of("company");
    let period_index = index_of("period");
    let date_index = index_of("date");
    let numeric_indices: Vec<(CanonicalField, usize)> = CanonicalField::ALL
        .iter()
        .filter_map(|field| index_of(field.as_str()).map(|index| (*field, index)))
        .collect();

    // Header is row 1
    for (offset, record) in reader.records().enumerate() {
        let row_num = offset + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.push(&location, format!("Row {row_num}: Error reading CSV: {e}"));
                continue;
            }
        };

        if let Some(company) = company_index.and_then(|i| record.get(i)) {
            if !is_known_company(company) {
                report.push(
                    &location,
                    format!(
                        "Row {row_num}: Invalid company code '{company}' (expected {} or {})",
                        COMPANY_CODES[0], COMPANY_CODES[1]
                    ),
                );
            }
        }

        if let Some(period) = period_index.and_then(|i| record.get(i)) {
            if !is_valid_period(period) {
                report.push(
                    &location,
                    format!("Row {row_num}: Invalid period format '{period}' (expected YYYYQQ)"),
                );
            }
        }

        if let Some(date) = date_index.and_then(|i| record.get(i)) {
            if !is_valid_date(date) {
                report.push(
                    &location,
                    format!("Row {row_num}: Invalid date format '{date}' (expected YYYY-MM-DD)"),
                );
            }
        }

        for (field, index) in &numeric_indices {
            let Some(cell) = record.get(*index) else {
                continue;
            };
            if !cell.is_empty() && cell.parse::<f64>().is_err() {
                report.push(
                    &location,
                    format!("Row {row_num}: Field '{field}' is not a valid number: {cell}"),
                );
            }
        }
    }

    report
}

/// Validate the notes collection JSON against the fixed schema, including
/// the exact schema version
pub fn validate_notes_file(path: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    let location = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            report.push(&location, format!("File not found: {e}"));
            return report;
        }
    };
    let data: Value = match serde_json::from_str(&content) {
        Ok(data) => data,
        Err(e) => {
            report.push(&location, format!("Invalid JSON format: {e}"));
            return report;
        }
    };

    match data.get("schema_version") {
        None => report.push(&location, "Missing 'schema_version' field"),
        Some(version) => {
            let version = version.as_str().unwrap_or_default();
            if version != SCHEMA_VERSION {
                report.push(
                    &location,
                    format!("Schema version mismatch: expected {SCHEMA_VERSION}, got {version}"),
                );
            }
        }
    }

    match data.get("notes") {
        None => report.push(&location, "Missing 'notes' field"),
        Some(Value::Array(notes)) => {
            for (index, note) in notes.iter().enumerate() {
                validate_note_item(note, index, &location, &mut report);
            }
        }
        Some(_) => report.push(&location, "'notes' field must be an array"),
    }

    report
}

fn validate_note_item(note: &Value, index: usize, location: &str, report: &mut ValidationReport) {
    let prefix = format!("Note {index}");

    for field in NOTE_REQUIRED_FIELDS {
        if note.get(field).is_none() {
            report.push(location, format!("{prefix}: Missing required field '{field}'"));
        }
    }

    if let Some(company) = note.get("company") {
        let company = company.as_str().unwrap_or_default();
        if !is_known_company(company) {
            report.push(
                location,
                format!(
                    "{prefix}: Invalid company code '{company}' (expected {} or {})",
                    COMPANY_CODES[0], COMPANY_CODES[1]
                ),
            );
        }
    }

    if let Some(period) = note.get("period") {
        let period = period.as_str().unwrap_or_default();
        if !is_valid_period(period) {
            report.push(
                location,
                format!("{prefix}: Invalid period format '{period}' (expected YYYYQQ)"),
            );
        }
    }

    if let Some(category) = note.get("category") {
        let category = category.as_str().unwrap_or_default();
        if !NOTE_CATEGORIES.contains(&category) {
            report.push(
                location,
                format!(
                    "{prefix}: Invalid category '{category}' (expected one of {NOTE_CATEGORIES:?})"
                ),
            );
        }
    }

    if let Some(severity) = note.get("severity") {
        match severity.as_f64() {
            None => report.push(location, format!("{prefix}: severity must be a number")),
            Some(value) => {
                if !(0.0..=1.0).contains(&value) {
                    report.push(
                        location,
                        format!("{prefix}: severity must be between 0.0 and 1.0"),
                    );
                }
            }
        }
    }

    if let Some(keywords) = note.get("keywords") {
        match keywords.as_array() {
            None => report.push(location, format!("{prefix}: keywords must be an array")),
            Some(items) => {
                if items.is_empty() {
                    report.push(location, format!("{prefix}: keywords array cannot be empty"));
                }
            }
        }
    }
}

/// Validate every emitted statement CSV plus the notes collection.
///
/// Missing inputs (no CSVs yet, no notes file) are warnings, not errors;
/// the report collects only genuine schema violations.
pub fn validate_all(financials_dir: &Path, notes_path: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut csv_files: Vec<_> = match fs::read_dir(financials_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .collect(),
        Err(_) => Vec::new(),
    };
    csv_files.sort();

    if csv_files.is_empty() {
        warn!("No CSV files found in {}", financials_dir.display());
        println!("⚠️  No CSV files found in {}", financials_dir.display());
    }

    for csv_file in &csv_files {
        let file_report = validate_csv_file(csv_file);
        print_file_result(csv_file, &file_report);
        report.merge(file_report);
    }

    if !notes_path.exists() {
        warn!("Notes file not found: {}", notes_path.display());
        println!("⚠️  Notes file not found: {}", notes_path.display());
    } else {
        let notes_report = validate_notes_file(notes_path);
        print_file_result(notes_path, &notes_report);
        report.merge(notes_report);
    }

    report
}

fn print_file_result(path: &Path, report: &ValidationReport) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if report.passed() {
        println!("✓ {name}: PASS");
    } else {
        println!("✗ {name}: FAIL");
        for issue in &report.issues {
            println!("  - {}", issue.message);
        }
    }
}
