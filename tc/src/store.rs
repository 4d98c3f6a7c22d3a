//! TaskStore trait and HTTP implementation
//!
//! The trait is the seam the state mirror mutates through; the HTTP
//! implementation talks to the remote task API. Each method maps to one
//! endpoint and returns the authoritative representation the server echoes
//! back, already normalized through the envelope adapter.

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::{Task, TaskDraft, TaskPatch, TaskStatus};

/// Remote task store contract
///
/// All mutations return the server's echo of the affected task so callers
/// can reconcile local state against authoritative fields (timestamps,
/// server-side defaults).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch the full ordered task collection, nested subtasks included
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError>;

    /// Create a task; the response carries the server-assigned identifier
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError>;

    /// Apply a partial update to a task
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;

    /// Update a task's status
    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ApiError>;

    /// Update a subtask's status within its parent task
    async fn update_subtask_status(
        &self,
        id: &str,
        subtask_id: &str,
        status: TaskStatus,
    ) -> Result<Task, ApiError>;

    /// Delete a task
    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;
}

/// HTTP-backed task store
pub struct HttpTaskStore {
    transport: Transport,
}

impl HttpTaskStore {
    /// Create a store client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(base_url = %config.base_url, "HttpTaskStore::from_config: called");
        let transport = Transport::from_config(config, config.timeout_ms)?;
        Ok(Self { transport })
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        debug!("HttpTaskStore::list_tasks: called");
        self.transport.execute(Method::GET, "/tasks", None).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        debug!(title = %draft.title, "HttpTaskStore::create_task: called");
        let body = serde_json::to_value(draft)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to encode draft: {}", e)))?;
        self.transport.execute(Method::POST, "/tasks", Some(&body)).await
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        debug!(%id, "HttpTaskStore::update_task: called");
        let body = serde_json::to_value(patch)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to encode patch: {}", e)))?;
        self.transport
            .execute(Method::PUT, &format!("/tasks/{}", id), Some(&body))
            .await
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ApiError> {
        debug!(%id, %status, "HttpTaskStore::update_task_status: called");
        let body = serde_json::json!({ "status": status });
        self.transport
            .execute(Method::PUT, &format!("/tasks/{}/status", id), Some(&body))
            .await
    }

    async fn update_subtask_status(
        &self,
        id: &str,
        subtask_id: &str,
        status: TaskStatus,
    ) -> Result<Task, ApiError> {
        debug!(%id, %subtask_id, %status, "HttpTaskStore::update_subtask_status: called");
        let body = serde_json::json!({ "status": status });
        self.transport
            .execute(
                Method::PATCH,
                &format!("/tasks/{}/subtasks/{}/status", id, subtask_id),
                Some(&body),
            )
            .await
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        debug!(%id, "HttpTaskStore::delete_task: called");
        self.transport
            .execute_unit(Method::DELETE, &format!("/tasks/{}", id), None)
            .await
    }
}
