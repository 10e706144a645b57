use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_SOURCE_BYTES, DEFAULT_USER_AGENT};

fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_max_source_bytes() -> usize {
    DEFAULT_MAX_SOURCE_BYTES
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Outbound HTTP settings for source and overlay fetches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds (connect + headers + body)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bodies larger than this are rejected
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_source_bytes: default_max_source_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("fetch.timeout_secs must be at least 1".to_string());
        }
        if self.max_source_bytes == 0 {
            return Err("fetch.max_source_bytes must be at least 1".to_string());
        }
        Ok(())
    }
}
