//! Task list state management
//!
//! [`manager`] owns the mirrored collection and the optimistic-update
//! lifecycle; [`merge`] holds the pure identity-preserving collection
//! rebuilds; [`mutation`] guards against stale resolutions of racing
//! same-entity mutations.

pub mod manager;

mod merge;
mod mutation;

pub use manager::{TaskListError, TaskListManager};
