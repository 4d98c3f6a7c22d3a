//! State-change events broadcast by the task mirror
//!
//! Every observable change to the mirrored collection emits one of these,
//! so a UI layer can re-render, surface failure indications, and show
//! per-task generation placeholders. Emission is fire-and-forget over a
//! tokio broadcast channel; no subscribers is fine.

use serde::{Deserialize, Serialize};

/// Default broadcast channel capacity (events)
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// The vocabulary of task mirror activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskEvent {
    /// The collection was replaced wholesale by a fetch
    Reloaded { count: usize },

    /// A server-confirmed task was appended
    TaskCreated { id: String },

    /// A task was optimistically updated (status or fields)
    TaskUpdated { id: String },

    /// A subtask was optimistically updated
    SubtaskUpdated { task_id: String, subtask_id: String },

    /// A task was removed
    TaskRemoved { id: String },

    /// A mutation was rejected by the remote store
    ///
    /// `rolled_back` is false when a newer mutation for the same entity
    /// superseded the rejected one, so no snapshot was restored.
    MutationFailed {
        id: String,
        operation: String,
        rolled_back: bool,
        message: String,
    },

    /// AI subtask generation started for a task
    GenerationStarted { id: String },

    /// AI generation finished and the subtask sequence was replaced
    SubtasksGenerated { id: String, count: usize },

    /// AI generation failed; the prior subtasks were kept
    GenerationFailed { id: String, message: String },
}

impl TaskEvent {
    /// Event type name for logging and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Reloaded { .. } => "Reloaded",
            Self::TaskCreated { .. } => "TaskCreated",
            Self::TaskUpdated { .. } => "TaskUpdated",
            Self::SubtaskUpdated { .. } => "SubtaskUpdated",
            Self::TaskRemoved { .. } => "TaskRemoved",
            Self::MutationFailed { .. } => "MutationFailed",
            Self::GenerationStarted { .. } => "GenerationStarted",
            Self::SubtasksGenerated { .. } => "SubtasksGenerated",
            Self::GenerationFailed { .. } => "GenerationFailed",
        }
    }

    /// The task this event concerns, if any
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Reloaded { .. } => None,
            Self::TaskCreated { id }
            | Self::TaskUpdated { id }
            | Self::TaskRemoved { id }
            | Self::MutationFailed { id, .. }
            | Self::GenerationStarted { id }
            | Self::SubtasksGenerated { id, .. }
            | Self::GenerationFailed { id, .. } => Some(id),
            Self::SubtaskUpdated { task_id, .. } => Some(task_id),
        }
    }
}
