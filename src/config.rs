use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct SearchConfig {
    /// Bearer credential for the search API. Never logged.
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_results: usize,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &if !self.is_configured() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_results", &self.max_results)
            .finish()
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A blank or whitespace-only key counts as unset.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Pause between simulated agent steps.
    pub step_delay_ms: u64,
}

impl PipelineConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }
}

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const DEFAULT_STEP_DELAY_MS: u64 = 1500;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            search: SearchConfig {
                api_key: env::var("TAVILY_API_KEY").unwrap_or_default(),
                base_url: env::var("TAVILY_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
                timeout_secs: env::var("SEARCH_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()?,
                max_results: env::var("SEARCH_MAX_RESULTS")
                    .unwrap_or_else(|_| DEFAULT_MAX_RESULTS.to_string())
                    .parse()?,
            },
            pipeline: PipelineConfig {
                step_delay_ms: env::var("STEP_DELAY_MS")
                    .unwrap_or_else(|_| DEFAULT_STEP_DELAY_MS.to_string())
                    .parse()?,
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_data_dir()),
            },
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("deep-research"))
        .unwrap_or_else(|| PathBuf::from(".deep-research"))
}
