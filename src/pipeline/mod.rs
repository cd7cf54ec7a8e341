pub mod aggregate;
pub mod normalize;
pub mod period;
pub mod taxonomy;

use crate::archive;
use crate::error::Result;
use crate::pipeline::aggregate::Aggregator;
use crate::pipeline::taxonomy::TaxonomyMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Counts reported after one company's extraction run
#[derive(Debug)]
pub struct ExtractSummary {
    pub company: String,
    pub archives: usize,
    pub records: usize,
    pub skipped_documents: usize,
    pub tables_written: Vec<PathBuf>,
}

/// Cached archives for one company, in filename order.
///
/// Filename order keeps re-runs deterministic; the aggregator's stable sort
/// then guarantees byte-identical output for an unchanged input set.
fn company_cache_files(company: &str, cache_dir: &Path) -> Result<Vec<PathBuf>> {
    if !cache_dir.exists() {
        return Ok(Vec::new());
    }
    let prefix = format!("{company}_");
    let mut files: Vec<PathBuf> = fs::read_dir(cache_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "zip")
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(&prefix))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Process every cached archive for one company into the three statement
/// tables.
///
/// Per-document failures (unparseable settlement date, corrupt archive,
/// unreadable CSV) are logged and skipped; they never abort the batch.
#[instrument(skip(taxonomy, cache_dir, financials_dir))]
pub fn process_company_cache(
    company: &str,
    cache_dir: &Path,
    financials_dir: &Path,
    taxonomy: &TaxonomyMap,
) -> Result<ExtractSummary> {
    info!("=== Processing {} cache files ===", company);

    let cache_files = company_cache_files(company, cache_dir)?;
    info!("Found {} cache files", cache_files.len());

    let mut summary = ExtractSummary {
        company: company.to_string(),
        archives: cache_files.len(),
        records: 0,
        skipped_documents: 0,
        tables_written: Vec::new(),
    };

    if cache_files.is_empty() {
        warn!("No cache files found for {}", company);
        return Ok(summary);
    }

    let mut aggregator = Aggregator::new();

    for zip_path in &cache_files {
        let filename = zip_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Processing: {}", filename);

        let Some(settlement_date) = period::parse_settlement_date(&filename) else {
            warn!("Could not parse period from: {}", filename);
            summary.skipped_documents += 1;
            continue;
        };
        let token = period::classify(settlement_date);
        let date = settlement_date.format("%Y-%m-%d").to_string();

        let csv_files = archive::extract_csv_entries(zip_path, cache_dir);

        for csv_path in csv_files {
            match archive::read_line_items(&csv_path) {
                Ok(items) => {
                    if let Some(record) =
                        normalize::normalize_document(&items, company, token, &date, taxonomy)
                    {
                        debug!("Parsed data: {} with {} fields", token, record.fields.len());
                        aggregator.push(record);
                        summary.records += 1;
                    }
                }
                Err(e) => error!("Error parsing {}: {}", csv_path.display(), e),
            }
        }
    }

    fs::create_dir_all(financials_dir)?;
    for table in aggregator.into_tables() {
        if let Some(path) = table.write_csv(company, financials_dir)? {
            summary.tables_written.push(path);
        }
    }

    info!("=== Completed processing for {} ===", company);
    Ok(summary)
}
