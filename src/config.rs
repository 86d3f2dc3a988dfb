//! AssemblyAI client configuration
//!
//! API key and base URL come from the environment; the default base URL
//! targets AssemblyAI's EU region. Poll bounds cap how long a blocking
//! transcription call may wait.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Default base URL (EU region)
pub const DEFAULT_BASE_URL: &str = "https://api.eu.assemblyai.com";

const POLL_INTERVAL_MS: u64 = 3000; // Poll every 3 seconds
const MAX_POLL_ATTEMPTS: u32 = 200; // Max 10 minutes (200 * 3s)
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Configuration for the AssemblyAI gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyAiConfig {
    pub api_key: String,
    pub base_url: String,
    /// Delay between transcript status polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Upper bound on status polls before the submission is failed
    pub max_poll_attempts: u32,
    /// Per-request HTTP timeout, in seconds
    pub http_timeout_secs: u64,
}

impl AssemblyAiConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: POLL_INTERVAL_MS,
            max_poll_attempts: MAX_POLL_ATTEMPTS,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }

    /// Read configuration from `ASSEMBLYAI_API_KEY` and `ASSEMBLYAI_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ASSEMBLYAI_API_KEY")
            .map_err(|_| AppError::Config("ASSEMBLYAI_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ASSEMBLYAI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Sets the base URL (builder pattern)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
