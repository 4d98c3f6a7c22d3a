//! taskmirror - optimistic task-list state mirror
//!
//! taskmirror keeps an in-memory mirror of a remote task collection and
//! mediates between optimistic local mutation and authoritative server
//! state. Mutations apply locally before the network resolves, so a UI
//! reflects intent immediately; confirmations reconcile the server echo
//! and rejections restore the pre-mutation snapshot.
//!
//! # Core Concepts
//!
//! - **Optimistic First**: every mutation lands in the mirror synchronously
//! - **Identity-Preserving Merge**: entities are located by id, never by
//!   position, and the collection is replaced by structural copy
//! - **Last Intent Wins**: per-entity sequence numbers discard stale
//!   resolutions of racing same-entity mutations
//! - **One Rollback Policy**: every rejected mutation restores its
//!   snapshot through the same guarded code path
//!
//! # Modules
//!
//! - [`state`] - TaskListManager and the merge/sequencing internals
//! - [`events`] - state-change events broadcast to subscribers
//! - [`validation`] - local input validation
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod events;
pub mod state;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use events::TaskEvent;
pub use state::{TaskListError, TaskListManager};
