//! Shared HTTP plumbing for the store and AI clients
//!
//! One request path: JSON body out, envelope-normalized payload back,
//! bounded exponential-backoff retry on transient failures.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::envelope::parse_payload;
use crate::error::{ApiError, is_retryable_status};

/// How much of an error body to keep in the error message
const ERROR_BODY_LIMIT: usize = 200;

pub(crate) struct Transport {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl Transport {
    /// Build a transport from config with the given per-request timeout
    pub(crate) fn from_config(config: &ApiConfig, timeout_ms: u64) -> Result<Self, ApiError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url_trimmed().to_string(),
            auth_token: config.auth_token(),
            max_retries: config.max_retries,
            initial_backoff_ms: config.initial_backoff_ms,
        })
    }

    /// Join a path onto the base URL
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a request and normalize the response payload
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, ApiError> {
        let text = self.execute_raw(method, path, body).await?;
        parse_payload(&text)
    }

    /// Issue a request where the caller only needs confirmation
    ///
    /// Delete endpoints may answer with an empty body; that still counts as
    /// success as long as the status was 2xx.
    pub(crate) async fn execute_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), ApiError> {
        let text = self.execute_raw(method, path, body).await?;
        if text.trim().is_empty() {
            return Ok(());
        }
        // Non-empty confirmations still go through the envelope so a
        // `success: false` body is not mistaken for a confirmation.
        parse_payload::<serde_json::Value>(&text).map(|_| ())
    }

    async fn execute_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(path);
        let mut attempt: u32 = 0;

        loop {
            debug!(%method, %url, attempt, "transport: sending request");

            let mut request = self.http.request(method.clone(), url.as_str());
            if let Some(token) = &self.auth_token {
                request = request.bearer_auth(token);
            }
            if let Some(json) = body {
                request = request.json(json);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    if transient && attempt < self.max_retries {
                        warn!(error = %e, attempt, "transport: transient network error, retrying");
                        self.backoff(attempt).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(ApiError::Network(e));
                }
            };

            let status = response.status();
            let text = response.text().await.map_err(ApiError::Network)?;

            if status.is_success() {
                return Ok(text);
            }

            if is_retryable_status(status.as_u16()) && attempt < self.max_retries {
                warn!(status = status.as_u16(), attempt, "transport: retryable status, retrying");
                self.backoff(attempt).await;
                attempt += 1;
                continue;
            }

            let message: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
    }

    async fn backoff(&self, attempt: u32) {
        let delay = self.initial_backoff_ms.saturating_mul(1u64 << attempt.min(10));
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}
