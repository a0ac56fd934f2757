//! Environment-driven configuration.

use std::path::PathBuf;

use crate::models::AllowancePolicy;

/// Default record store URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:17020/api/v1";

/// Default page shared by the share reward.
pub const DEFAULT_SHARE_URL: &str = "https://oryn.tw";

/// Default per-IP request budget per minute.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    /// Record store base URL (from ORYN_VOTE_URL)
    pub api_url: String,
    /// Bearer key for the record store (from ORYN_VOTE_API_KEY)
    pub api_key: Option<String>,
    /// Requests per minute per IP when serving (from ORYN_VOTE_RATE_LIMIT)
    pub rate_limit: u32,
    /// Allowed CORS origins (from ORYN_VOTE_CORS_ORIGINS, comma-separated)
    pub cors_origins: Option<Vec<String>>,
    /// URL handed to share targets (from ORYN_VOTE_SHARE_URL)
    pub share_url: String,
    /// Where local state and the server database live (from ORYN_VOTE_DATA_DIR)
    pub data_dir: PathBuf,
    pub allowance: AllowancePolicy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("ORYN_VOTE_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key = lookup("ORYN_VOTE_API_KEY").filter(|k| !k.is_empty());

        let rate_limit = match lookup("ORYN_VOTE_RATE_LIMIT") {
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid ORYN_VOTE_RATE_LIMIT {:?} ({}), using {}",
                    raw,
                    e,
                    DEFAULT_RATE_LIMIT
                );
                DEFAULT_RATE_LIMIT
            }),
            None => DEFAULT_RATE_LIMIT,
        };

        let cors_origins = lookup("ORYN_VOTE_CORS_ORIGINS").map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });

        let share_url =
            lookup("ORYN_VOTE_SHARE_URL").unwrap_or_else(|| DEFAULT_SHARE_URL.to_string());

        let data_dir = match lookup("ORYN_VOTE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => directories::ProjectDirs::from("tw", "oryn", "oryn-vote")
                .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
                .data_dir()
                .to_path_buf(),
        };

        Ok(Self {
            api_url,
            api_key,
            rate_limit,
            cors_origins,
            share_url,
            data_dir,
            allowance: AllowancePolicy::default(),
        })
    }

    /// Visitor-side key-value state.
    pub fn local_state_path(&self) -> PathBuf {
        self.data_dir.join("local-state.json")
    }

    /// Server-side record store.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("oryn-vote.db")
    }
}
