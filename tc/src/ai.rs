//! AiService trait and HTTP implementation
//!
//! The AI endpoints are long-latency, fallible black boxes: given a task
//! title they produce a generated subtask breakdown or a description. The
//! client gets its own (longer) timeout; retry policy is the same bounded
//! backoff as the store.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::Task;

/// Remote AI generation contract
#[async_trait]
pub trait AiService: Send + Sync {
    /// Generate a subtask breakdown for a task
    ///
    /// Returns the full task representation with its new subtask sequence
    /// populated; the caller replaces its local sequence wholesale.
    async fn generate_subtasks(&self, task_id: &str, title: &str) -> Result<Task, ApiError>;

    /// Generate a description from a task title
    async fn generate_description(&self, title: &str) -> Result<String, ApiError>;
}

/// Response shape of `/ai/generate-subtasks`
#[derive(Debug, Deserialize)]
struct GeneratedSubtasks {
    task: Task,
}

/// Response shape of `/ai/generate-description`
#[derive(Debug, Deserialize)]
struct GeneratedDescription {
    description: String,
}

/// HTTP-backed AI service client
pub struct HttpAiClient {
    transport: Transport,
}

impl HttpAiClient {
    /// Create an AI client from configuration
    ///
    /// Uses `ai-timeout-ms` rather than the store timeout.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(base_url = %config.base_url, timeout_ms = config.ai_timeout_ms, "HttpAiClient::from_config: called");
        let transport = Transport::from_config(config, config.ai_timeout_ms)?;
        Ok(Self { transport })
    }
}

#[async_trait]
impl AiService for HttpAiClient {
    async fn generate_subtasks(&self, task_id: &str, title: &str) -> Result<Task, ApiError> {
        debug!(%task_id, %title, "HttpAiClient::generate_subtasks: called");
        let body = serde_json::json!({ "title": title, "taskId": task_id });
        let generated: GeneratedSubtasks = self
            .transport
            .execute(Method::POST, "/ai/generate-subtasks", Some(&body))
            .await?;
        Ok(generated.task)
    }

    async fn generate_description(&self, title: &str) -> Result<String, ApiError> {
        debug!(%title, "HttpAiClient::generate_description: called");
        let body = serde_json::json!({ "title": title });
        let generated: GeneratedDescription = self
            .transport
            .execute(Method::POST, "/ai/generate-description", Some(&body))
            .await?;
        Ok(generated.description)
    }
}
