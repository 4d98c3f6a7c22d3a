//! TaskListManager - owns the mirrored task collection
//!
//! The manager is the single source of truth for what the UI currently
//! believes the task list looks like. It applies optimistic mutations
//! synchronously, issues the remote call with the lock released, and
//! reconciles the resolution later: confirmations commit the server echo,
//! rejections restore the pre-mutation snapshot. Both sides pass through
//! the per-entity sequence guard so a stale resolution can never clobber
//! newer intent.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use taskclient::{AiService, ApiError, Subtask, Task, TaskDraft, TaskPatch, TaskStatus, TaskStore};

use crate::events::{DEFAULT_EVENT_CAPACITY, TaskEvent};
use crate::validation::{validate_draft, validate_patch};

use super::merge;
use super::mutation::MutationTracker;

/// Errors from task list operations
#[derive(Debug, Error)]
pub enum TaskListError {
    /// Rejected locally before any remote call was issued
    #[error("validation failed: {0}")]
    Validation(String),

    /// The remote store or AI service failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// State owned by the manager behind its lock
///
/// The lock is only ever held inside synchronous read-modify-write
/// sections; no remote call happens while it is taken.
struct Inner {
    /// The mirrored collection. Replaced wholesale on every change so
    /// observers can rely on `Arc::ptr_eq` change detection.
    tasks: Arc<Vec<Task>>,
    tracker: MutationTracker,
    /// Tasks with an AI generation in flight
    generating: HashSet<String>,
}

/// Optimistic state mirror over a remote task store
pub struct TaskListManager {
    store: Arc<dyn TaskStore>,
    ai: Arc<dyn AiService>,
    inner: Mutex<Inner>,
    event_tx: broadcast::Sender<TaskEvent>,
}

impl TaskListManager {
    /// Create a manager over the given store and AI service
    ///
    /// Both collaborators are injected explicitly; the manager carries no
    /// ambient context, which keeps it testable in isolation.
    pub fn new(store: Arc<dyn TaskStore>, ai: Arc<dyn AiService>) -> Self {
        debug!("TaskListManager::new: called");
        let (event_tx, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            store,
            ai,
            inner: Mutex::new(Inner {
                tasks: Arc::new(Vec::new()),
                tracker: MutationTracker::new(),
                generating: HashSet::new(),
            }),
            event_tx,
        }
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Current collection, cheap to take and compare by reference
    pub fn snapshot(&self) -> Arc<Vec<Task>> {
        Arc::clone(&self.lock().tasks)
    }

    /// Look up a task by identifier
    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.lock().tasks.iter().find(|t| t.id == task_id).cloned()
    }

    /// Whether an AI generation is in flight for the task
    pub fn is_generating(&self, task_id: &str) -> bool {
        self.lock().generating.contains(task_id)
    }

    /// Fetch the full collection and replace the mirror wholesale
    ///
    /// This is a full reconciliation point: optimistic edits that have not
    /// been confirmed yet are superseded by the fetched state. On failure
    /// the mirror is left untouched.
    pub async fn load_all(&self) -> Result<Arc<Vec<Task>>, TaskListError> {
        debug!("load_all: called");
        let fetched = self.store.list_tasks().await?;
        let tasks = Arc::new(fetched);
        {
            let mut inner = self.lock();
            inner.tasks = Arc::clone(&tasks);
        }
        self.emit(TaskEvent::Reloaded { count: tasks.len() });
        Ok(tasks)
    }

    /// Set a task's status
    ///
    /// The mirror reflects the new status synchronously, before the remote
    /// call resolves. An identifier absent from the mirror is a local
    /// no-op; the remote call still proceeds, since the entity may exist
    /// remotely without being reflected locally yet.
    pub async fn set_status(&self, task_id: &str, status: TaskStatus) -> Result<(), TaskListError> {
        debug!(%task_id, %status, "set_status: called");
        let (seq, snapshot, applied) = {
            let mut inner = self.lock();
            let seq = inner.tracker.begin(task_id);
            let snapshot = Arc::clone(&inner.tasks);
            let applied = match merge::replace_task(&inner.tasks, task_id, |t| {
                let mut t = t.clone();
                t.status = status;
                t
            }) {
                Some(next) => {
                    inner.tasks = Arc::new(next);
                    true
                }
                None => {
                    debug!(%task_id, "set_status: not found locally, remote call still proceeds");
                    false
                }
            };
            (seq, snapshot, applied)
        };
        if applied {
            self.emit(TaskEvent::TaskUpdated { id: task_id.to_string() });
        }

        match self.store.update_task_status(task_id, status).await {
            Ok(echo) => {
                self.commit_status(task_id, seq, &echo);
                Ok(())
            }
            Err(e) => {
                let rolled_back = applied && self.rollback(task_id, seq, &snapshot);
                self.mutation_failed(task_id, "set_status", rolled_back, &e);
                Err(e.into())
            }
        }
    }

    /// Set a subtask's status, independent of its parent's status
    pub async fn set_subtask_status(
        &self,
        task_id: &str,
        subtask_id: &str,
        status: TaskStatus,
    ) -> Result<(), TaskListError> {
        debug!(%task_id, %subtask_id, %status, "set_subtask_status: called");
        let (seq, snapshot, applied) = {
            let mut inner = self.lock();
            let seq = inner.tracker.begin(task_id);
            let snapshot = Arc::clone(&inner.tasks);
            let applied = match merge::replace_subtask(&inner.tasks, task_id, subtask_id, |s| {
                let mut s = s.clone();
                s.status = status;
                s
            }) {
                Some(next) => {
                    inner.tasks = Arc::new(next);
                    true
                }
                None => {
                    debug!(%task_id, %subtask_id, "set_subtask_status: not found locally, remote call still proceeds");
                    false
                }
            };
            (seq, snapshot, applied)
        };
        if applied {
            self.emit(TaskEvent::SubtaskUpdated {
                task_id: task_id.to_string(),
                subtask_id: subtask_id.to_string(),
            });
        }

        match self.store.update_subtask_status(task_id, subtask_id, status).await {
            Ok(echo) => {
                self.commit_subtask_status(task_id, subtask_id, seq, &echo);
                Ok(())
            }
            Err(e) => {
                let rolled_back = applied && self.rollback(task_id, seq, &snapshot);
                self.mutation_failed(task_id, "set_subtask_status", rolled_back, &e);
                Err(e.into())
            }
        }
    }

    /// Create a task from a draft
    ///
    /// No pending placeholder enters the mirror: the collection only ever
    /// contains tasks with a server-confirmed identifier. On failure the
    /// mirror is unchanged.
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, TaskListError> {
        debug!(title = %draft.title, "create: called");
        validate_draft(&draft)?;

        let created = self.store.create_task(&draft).await?;
        {
            let mut inner = self.lock();
            inner.tasks = Arc::new(merge::append_task(&inner.tasks, created.clone()));
        }
        self.emit(TaskEvent::TaskCreated { id: created.id.clone() });
        Ok(created)
    }

    /// Apply a partial update to a task
    ///
    /// The merge is field-level: attributes absent from the patch are left
    /// untouched locally, the subtask sequence included. On confirmation
    /// the patched fields are reconciled from the server echo.
    pub async fn update(&self, task_id: &str, patch: TaskPatch) -> Result<(), TaskListError> {
        debug!(%task_id, "update: called");
        validate_patch(&patch)?;

        let (seq, snapshot, applied) = {
            let mut inner = self.lock();
            let seq = inner.tracker.begin(task_id);
            let snapshot = Arc::clone(&inner.tasks);
            let applied = match merge::replace_task(&inner.tasks, task_id, |t| merge::merge_patch(t, &patch)) {
                Some(next) => {
                    inner.tasks = Arc::new(next);
                    true
                }
                None => {
                    debug!(%task_id, "update: not found locally, remote call still proceeds");
                    false
                }
            };
            (seq, snapshot, applied)
        };
        if applied {
            self.emit(TaskEvent::TaskUpdated { id: task_id.to_string() });
        }

        match self.store.update_task(task_id, &patch).await {
            Ok(echo) => {
                let mut inner = self.lock();
                if inner.tracker.is_latest(task_id, seq) {
                    if let Some(next) =
                        merge::replace_task(&inner.tasks, task_id, |t| merge::merge_echo(t, &patch, &echo))
                    {
                        inner.tasks = Arc::new(next);
                    }
                }
                Ok(())
            }
            Err(e) => {
                let rolled_back = applied && self.rollback(task_id, seq, &snapshot);
                self.mutation_failed(task_id, "update", rolled_back, &e);
                Err(e.into())
            }
        }
    }

    /// Remove a task
    ///
    /// Removal is optimistic and idempotent: an identifier already absent
    /// is a local no-op, while the delete request still goes out. On
    /// rejection the task is reinserted at its original position.
    pub async fn remove(&self, task_id: &str) -> Result<(), TaskListError> {
        debug!(%task_id, "remove: called");
        let (seq, snapshot, was_present) = {
            let mut inner = self.lock();
            let seq = inner.tracker.begin(task_id);
            let snapshot = Arc::clone(&inner.tasks);
            let was_present = match merge::remove_task(&inner.tasks, task_id) {
                Some(next) => {
                    inner.tasks = Arc::new(next);
                    true
                }
                None => {
                    debug!(%task_id, "remove: already absent locally");
                    false
                }
            };
            (seq, snapshot, was_present)
        };
        if was_present {
            self.emit(TaskEvent::TaskRemoved { id: task_id.to_string() });
        }

        match self.store.delete_task(task_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let rolled_back = was_present && self.rollback(task_id, seq, &snapshot);
                self.mutation_failed(task_id, "remove", rolled_back, &e);
                Err(e.into())
            }
        }
    }

    /// Generate a subtask breakdown for a task via the AI service
    ///
    /// The task is marked as generating for the duration of the call so
    /// the UI can render a placeholder. On success the returned subtask
    /// sequence replaces the local one wholesale; on failure the prior
    /// subtasks are kept and the indicator clears.
    pub async fn generate_subtasks(&self, task_id: &str, title: &str) -> Result<Vec<Subtask>, TaskListError> {
        debug!(%task_id, %title, "generate_subtasks: called");
        let seq = {
            let mut inner = self.lock();
            let seq = inner.tracker.begin(task_id);
            inner.generating.insert(task_id.to_string());
            seq
        };
        self.emit(TaskEvent::GenerationStarted { id: task_id.to_string() });

        match self.ai.generate_subtasks(task_id, title).await {
            Ok(generated) => {
                let subtasks = generated.subtasks;
                {
                    let mut inner = self.lock();
                    inner.generating.remove(task_id);
                    if inner.tracker.is_latest(task_id, seq) {
                        if let Some(next) = merge::replace_subtasks(&inner.tasks, task_id, subtasks.clone()) {
                            inner.tasks = Arc::new(next);
                        }
                    }
                }
                self.emit(TaskEvent::SubtasksGenerated {
                    id: task_id.to_string(),
                    count: subtasks.len(),
                });
                Ok(subtasks)
            }
            Err(e) => {
                {
                    let mut inner = self.lock();
                    inner.generating.remove(task_id);
                }
                self.emit(TaskEvent::GenerationFailed {
                    id: task_id.to_string(),
                    message: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Generate a description from a title via the AI service
    ///
    /// Pure passthrough; the mirror is not touched.
    pub async fn generate_description(&self, title: &str) -> Result<String, TaskListError> {
        debug!(%title, "generate_description: called");
        if title.trim().is_empty() {
            return Err(TaskListError::Validation("title must not be empty".to_string()));
        }
        Ok(self.ai.generate_description(title).await?)
    }

    // === Internals ===

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic mid-section cannot leave the mirror half-written (every
        // write is a single Arc replacement), so a poisoned lock is safe
        // to recover.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: TaskEvent) {
        debug!(event_type = event.event_type(), task_id = ?event.task_id(), "emit");
        // Ignore send errors (no subscribers is OK)
        let _ = self.event_tx.send(event);
    }

    fn mutation_failed(&self, task_id: &str, operation: &str, rolled_back: bool, error: &ApiError) {
        warn!(%task_id, operation, rolled_back, error = %error, "mutation rejected by remote store");
        self.emit(TaskEvent::MutationFailed {
            id: task_id.to_string(),
            operation: operation.to_string(),
            rolled_back,
            message: error.to_string(),
        });
    }

    /// Commit a confirmed status mutation
    ///
    /// Local state already reflects the intent; only the authoritative
    /// status and timestamp are taken from the echo, and only while this
    /// mutation is still the latest for the entity.
    fn commit_status(&self, task_id: &str, seq: u64, echo: &Task) {
        let mut inner = self.lock();
        if !inner.tracker.is_latest(task_id, seq) {
            return;
        }
        if let Some(next) = merge::replace_task(&inner.tasks, task_id, |t| {
            let mut t = t.clone();
            t.status = echo.status;
            t.updated_at = echo.updated_at;
            t
        }) {
            inner.tasks = Arc::new(next);
        }
    }

    /// Commit a confirmed subtask status mutation
    fn commit_subtask_status(&self, task_id: &str, subtask_id: &str, seq: u64, echo: &Task) {
        let mut inner = self.lock();
        if !inner.tracker.is_latest(task_id, seq) {
            return;
        }
        let Some(echo_subtask) = echo.subtask(subtask_id).cloned() else {
            return;
        };
        if let Some(next) = merge::replace_subtask(&inner.tasks, task_id, subtask_id, |s| {
            let mut s = s.clone();
            s.status = echo_subtask.status;
            s.updated_at = echo_subtask.updated_at;
            s
        }) {
            inner.tasks = Arc::new(next);
        }
    }

    /// Restore the affected entity from the pre-mutation snapshot
    ///
    /// Skipped when a newer mutation for the same entity has been issued
    /// meanwhile; rolling back would clobber that newer intent. Returns
    /// whether the restore happened.
    fn rollback(&self, task_id: &str, seq: u64, snapshot: &Arc<Vec<Task>>) -> bool {
        let mut inner = self.lock();
        if !inner.tracker.is_latest(task_id, seq) {
            return false;
        }
        inner.tasks = Arc::new(merge::restore_task(&inner.tasks, snapshot, task_id));
        true
    }
}
