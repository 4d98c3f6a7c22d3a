//! Client configuration for the task API

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Default request timeout for task store calls
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default request timeout for AI generation calls (long-latency)
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 120_000;

/// Maximum number of retries for transient errors
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Configuration for the HTTP clients
///
/// Auth is ambient in the original application; here it is an explicit,
/// injected concern: the bearer token is read from the named environment
/// variable, and requests go out unauthenticated when it is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the task API, e.g. `http://localhost:4000/api`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable holding the bearer token
    #[serde(rename = "auth-token-env")]
    pub auth_token_env: String,

    /// Request timeout in milliseconds for task store calls
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Request timeout in milliseconds for AI generation calls
    #[serde(rename = "ai-timeout-ms")]
    pub ai_timeout_ms: u64,

    /// Maximum retries for transient errors
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds (doubles per attempt)
    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".to_string(),
            auth_token_env: "TASKMIRROR_TOKEN".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            ai_timeout_ms: DEFAULT_AI_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
        }
    }
}

impl ApiConfig {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with a clear message.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base-url must not be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::Config(format!(
                "base-url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ApiError::Config("timeout-ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Read the bearer token from the configured environment variable
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn auth_token(&self) -> Option<String> {
        std::env::var(&self.auth_token_env).ok().filter(|t| !t.is_empty())
    }

    /// Base URL with any trailing slash removed
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
