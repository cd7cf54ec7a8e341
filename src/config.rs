use crate::constants;
use crate::error::{EtlError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, resolved once at startup from the environment.
///
/// `.env.local` takes precedence over `.env`; both are optional. The API key
/// is only required by the fetch stage, so its absence is not an error here.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub tepco_code: String,
    pub chubu_code: String,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();

        Self {
            api_key: std::env::var("EDINET_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            api_base: std::env::var("EDINET_API_BASE")
                .unwrap_or_else(|_| "https://api.edinet-fsa.go.jp/api/v2".to_string()),
            tepco_code: std::env::var("TEPCO_CODE")
                .unwrap_or_else(|_| constants::TEPCO_EDINET_CODE.to_string()),
            chubu_code: std::env::var("CHUBU_CODE")
                .unwrap_or_else(|_| constants::CHUBU_EDINET_CODE.to_string()),
            max_retries: std::env::var("EDINET_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            retry_delay: Duration::from_secs(
                std::env::var("EDINET_RETRY_DELAY_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            data_dir: std::env::var("FINSIGHT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
        }
    }

    /// The API key, or a fatal configuration error for stages that need it
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            EtlError::Config("EDINET_API_KEY is not set. Please set it in .env.local".to_string())
        })
    }

    /// Downloaded filing archives live here
    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join(".cache")
    }

    /// Emitted statement tables live here
    pub fn financials_dir(&self) -> PathBuf {
        self.data_dir.join("financials")
    }

    pub fn taxonomy_path(&self) -> PathBuf {
        self.data_dir.join("taxonomy_map.json")
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_dir.join("xbrl_notes.json")
    }

    /// EDINET code for a company code, if the company is known
    pub fn edinet_code_for(&self, company: &str) -> Option<&str> {
        match company {
            constants::TEPCO => Some(&self.tepco_code),
            constants::CHUBU => Some(&self.chubu_code),
            _ => None,
        }
    }
}
