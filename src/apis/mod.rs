pub mod edinet;

use crate::constants::{ANNUAL_REPORT_KEYWORD, QUARTERLY_REPORT_KEYWORD};
use crate::error::{EtlError, Result};
use crate::types::{DocumentDescriptor, DocumentSource};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

/// Scan listing dates backward from `end_date`, collecting quarterly and
/// annual securities reports filed by one company.
///
/// Listing failures for a single date are logged and skipped; only
/// authentication failures abort the scan. Requests are paced one per
/// second against the source's rate limit.
pub async fn find_company_documents(
    source: &dyn DocumentSource,
    edinet_code: &str,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    limit: usize,
) -> Result<Vec<DocumentDescriptor>> {
    let end = end_date.unwrap_or_else(|| Utc::now().date_naive());
    let start = start_date.unwrap_or_else(|| end - ChronoDuration::days(365 * 10));

    info!(
        "Searching documents for {} from {} to {}",
        edinet_code, start, end
    );

    let mut found = Vec::new();
    let mut current = end;

    while current >= start && found.len() < limit {
        let date_str = current.format("%Y-%m-%d").to_string();

        match source.list_documents(&date_str).await {
            Ok(results) => {
                for doc in results {
                    if doc.edinet_code.as_deref() != Some(edinet_code) {
                        continue;
                    }
                    let description = doc.doc_description.clone().unwrap_or_default();
                    if description.contains(QUARTERLY_REPORT_KEYWORD)
                        || description.contains(ANNUAL_REPORT_KEYWORD)
                    {
                        info!(
                            "Found: {} - {} (period end: {})",
                            doc.doc_id,
                            description,
                            doc.period_end.as_deref().unwrap_or("unknown")
                        );
                        found.push(doc);
                        if found.len() >= limit {
                            break;
                        }
                    }
                }
            }
            // Auth failures are terminal, never per-date
            Err(EtlError::Auth(message)) => return Err(EtlError::Auth(message)),
            Err(e) => warn!("Error fetching documents for {}: {}", date_str, e),
        }

        match current.pred_opt() {
            Some(previous) => current = previous,
            None => break,
        }

        // Rate limiting: 1 request per second
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    info!("Found {} documents for {}", found.len(), edinet_code);
    Ok(found)
}

/// Fetch one company's filings into the cache directory.
///
/// Each document lands as `<COMPANY>_<docID>_<periodEnd>.zip`; documents
/// already cached are skipped, and a failed download is isolated to its
/// document. Only authentication failures abort the run.
pub async fn fetch_company_data(
    source: &dyn DocumentSource,
    edinet_code: &str,
    company: &str,
    years: u32,
    cache_dir: &Path,
) -> Result<()> {
    info!("=== Fetching data for {} ({}) ===", company, edinet_code);

    // Quarterly filings: four per year
    let limit = (years * 4) as usize;
    let docs = find_company_documents(source, edinet_code, None, None, limit).await?;

    if docs.is_empty() {
        warn!("No documents found for {}", company);
        return Ok(());
    }

    for doc in docs {
        let period_end = doc.period_end.as_deref().unwrap_or("unknown");
        let cache_filename = format!("{}_{}_{}.zip", company, doc.doc_id, period_end);
        let cache_path = cache_dir.join(&cache_filename);

        if cache_path.exists() {
            info!("Skipping {} (already cached)", doc.doc_id);
            continue;
        }

        match source.download_document(&doc.doc_id, &cache_path).await {
            Ok(true) => info!("Cached: {}", cache_filename),
            Ok(false) => warn!("Failed to download {}", doc.doc_id),
            Err(EtlError::Auth(message)) => return Err(EtlError::Auth(message)),
            Err(e) => error!("Error downloading {}: {}", doc.doc_id, e),
        }

        // Rate limiting between downloads
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    info!("=== Completed data fetch for {} ===", company);
    Ok(())
}
