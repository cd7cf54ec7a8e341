use crate::config::Config;
use crate::error::{EtlError, Result};
use crate::types::{DocumentDescriptor, DocumentSource};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Bounded retry policy for EDINET API calls: a fixed number of attempts
/// with a fixed delay between them. Authentication failures and not-found
/// responses are terminal and never consume a retry.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

/// Outcome of a single API attempt after status classification.
///
/// Auth failures (401) are returned as errors immediately and never appear
/// here; 404 is "no data", not an error.
enum Attempt<T> {
    Success(T),
    NoData,
    Retryable(String),
}

#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    #[serde(default)]
    results: Vec<DocumentDescriptor>,
}

/// Client for the EDINET document API v2
pub struct EdinetClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    retry: RetryPolicy,
}

impl EdinetClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    /// Build a client from configuration; fails when no API key is set
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            api_key: api_key.to_string(),
            retry: RetryPolicy {
                max_attempts: config.max_retries,
                delay: config.retry_delay,
            },
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn sleep_before_retry(&self, attempt: u32) {
        if attempt < self.retry.max_attempts {
            info!("Retrying in {} seconds...", self.retry.delay.as_secs());
            tokio::time::sleep(self.retry.delay).await;
        }
    }
}

#[async_trait::async_trait]
impl DocumentSource for EdinetClient {
    fn source_name(&self) -> &'static str {
        "edinet"
    }

    /// Call the documents listing endpoint for one filing date.
    ///
    /// Retries on non-200 statuses and timeouts up to the policy limit; 401
    /// aborts immediately, 404 means no filings for the date.
    #[instrument(skip(self))]
    async fn list_documents(&self, date: &str) -> Result<Vec<DocumentDescriptor>> {
        let url = format!("{}/documents.json", self.api_base);

        for attempt in 1..=self.retry.max_attempts {
            info!("Fetching documents list for date: {} (attempt {})", date, attempt);
            let outcome = self
                .client
                .get(&url)
                .query(&[("date", date), ("type", "2")])
                .header("Subscription-Key", &self.api_key)
                .timeout(Duration::from_secs(30))
                .send()
                .await;

            let attempt_result = match outcome {
                Ok(response) => match response.status().as_u16() {
                    200 => {
                        let body: DocumentListResponse = response.json().await?;
                        Attempt::Success(body.results)
                    }
                    401 => {
                        return Err(EtlError::Auth("invalid API key (401 Unauthorized)".into()))
                    }
                    404 => Attempt::NoData,
                    status => Attempt::Retryable(format!("API returned status {status}")),
                },
                Err(e) if e.is_timeout() => Attempt::Retryable("request timeout".to_string()),
                Err(e) => Attempt::Retryable(format!("request error: {e}")),
            };

            match attempt_result {
                Attempt::Success(results) => {
                    info!("Found {} documents", results.len());
                    return Ok(results);
                }
                Attempt::NoData => {
                    warn!("No documents found for date: {}", date);
                    return Ok(Vec::new());
                }
                Attempt::Retryable(reason) => {
                    warn!("{} (attempt {})", reason, attempt);
                    self.sleep_before_retry(attempt).await;
                }
            }
        }

        Err(EtlError::Api {
            message: format!(
                "failed to fetch documents list for {} after {} attempts",
                date, self.retry.max_attempts
            ),
        })
    }

    /// Download one filing archive (CSV bundle) to `output_path`.
    ///
    /// Same status classification as the listing call; a 404 returns false
    /// so the caller can record the gap without failing the batch.
    #[instrument(skip(self, output_path))]
    async fn download_document(&self, doc_id: &str, output_path: &Path) -> Result<bool> {
        let url = format!("{}/documents/{}", self.api_base, doc_id);

        for attempt in 1..=self.retry.max_attempts {
            info!("Downloading document {} (attempt {})", doc_id, attempt);
            let outcome = self
                .client
                .get(&url)
                .query(&[("type", "5")])
                .header("Subscription-Key", &self.api_key)
                .timeout(Duration::from_secs(60))
                .send()
                .await;

            let attempt_result = match outcome {
                Ok(response) => match response.status().as_u16() {
                    200 => {
                        let bytes = response.bytes().await?;
                        std::fs::write(output_path, &bytes)?;
                        Attempt::Success(())
                    }
                    401 => {
                        return Err(EtlError::Auth("invalid API key (401 Unauthorized)".into()))
                    }
                    404 => Attempt::NoData,
                    status => Attempt::Retryable(format!("API returned status {status}")),
                },
                Err(e) if e.is_timeout() => Attempt::Retryable("request timeout".to_string()),
                Err(e) => Attempt::Retryable(format!("request error: {e}")),
            };

            match attempt_result {
                Attempt::Success(()) => {
                    info!("Downloaded to: {}", output_path.display());
                    return Ok(true);
                }
                Attempt::NoData => {
                    warn!("Document {} not found (404)", doc_id);
                    return Ok(false);
                }
                Attempt::Retryable(reason) => {
                    warn!("{} (attempt {})", reason, attempt);
                    self.sleep_before_retry(attempt).await;
                }
            }
        }

        Err(EtlError::Api {
            message: format!(
                "failed to download {} after {} attempts",
                doc_id, self.retry.max_attempts
            ),
        })
    }
}
