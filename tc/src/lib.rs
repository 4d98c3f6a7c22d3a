//! taskclient - typed async client for the remote task API
//!
//! This crate owns the boundary to the remote task store and AI service:
//! the domain model as the wire speaks it, the response-envelope
//! normalization that gives everything above one canonical `Task` shape,
//! the transport error taxonomy, and the two async trait seams
//! ([`TaskStore`], [`AiService`]) with their reqwest-backed
//! implementations.
//!
//! # Modules
//!
//! - [`types`] - Task/Subtask domain model, drafts, patches
//! - [`envelope`] - `{success, data}` / flat response normalization
//! - [`store`] - TaskStore trait + HTTP implementation
//! - [`ai`] - AiService trait + HTTP implementation
//! - [`config`] - client configuration
//! - [`error`] - ApiError taxonomy

pub mod ai;
pub mod config;
pub mod envelope;
pub mod error;
pub mod store;
pub mod types;

mod transport;

pub use ai::{AiService, HttpAiClient};
pub use config::ApiConfig;
pub use envelope::ApiEnvelope;
pub use error::ApiError;
pub use store::{HttpTaskStore, TaskStore};
pub use types::{Priority, Subtask, Task, TaskDraft, TaskPatch, TaskStatus};
