//! Integration tests for the task mirror
//!
//! These tests exercise the manager through its public API against
//! scripted store implementations that control response timing, so the
//! optimistic-update lifecycle can be observed mid-flight: visibility
//! before confirmation, rollback on rejection, stale-response discard
//! under racing mutations, and the reload-during-mutation race.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use taskclient::{
    AiService, ApiError, Priority, Subtask, Task, TaskDraft, TaskPatch, TaskStatus, TaskStore,
};
use taskmirror::TaskListManager;

fn make_task(id: &str, title: &str, status: TaskStatus) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        status,
        priority: Priority::Low,
        due_date: None,
        start_date: None,
        category: None,
        subtasks: Vec::new(),
        user: "u1".to_string(),
        created_at: None,
        updated_at: None,
    }
}

fn make_subtask(id: &str, title: &str, status: TaskStatus) -> Subtask {
    Subtask {
        id: id.to_string(),
        title: title.to_string(),
        status,
        priority: None,
        created_at: None,
        updated_at: None,
    }
}

/// Store whose mutations block until the test releases them
///
/// Listing responds immediately with the scripted collection; every
/// mutation waits on the gate first, so a test can observe the mirror
/// while the request is "in flight".
struct GatedStore {
    listing: Mutex<Vec<Task>>,
    gate: Notify,
    gated: AtomicBool,
}

impl GatedStore {
    fn new(listing: Vec<Task>) -> Self {
        Self {
            listing: Mutex::new(listing),
            gate: Notify::new(),
            gated: AtomicBool::new(true),
        }
    }

    fn release_one(&self) {
        self.gate.notify_one();
    }

    async fn wait_for_gate(&self) {
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
    }
}

#[async_trait]
impl TaskStore for GatedStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        self.wait_for_gate().await;
        Ok(make_task("created", &draft.title, draft.status))
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        self.wait_for_gate().await;
        Ok(make_task(id, patch.title.as_deref().unwrap_or("echo"), TaskStatus::Todo))
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ApiError> {
        self.wait_for_gate().await;
        Ok(make_task(id, "echo", status))
    }

    async fn update_subtask_status(
        &self,
        id: &str,
        subtask_id: &str,
        status: TaskStatus,
    ) -> Result<Task, ApiError> {
        self.wait_for_gate().await;
        let mut echo = make_task(id, "echo", TaskStatus::Todo);
        echo.subtasks = vec![make_subtask(subtask_id, "echo", status)];
        Ok(echo)
    }

    async fn delete_task(&self, _id: &str) -> Result<(), ApiError> {
        self.wait_for_gate().await;
        Ok(())
    }
}

/// Store that resolves each status mutation after a scripted delay
///
/// Delays are popped per call, which lets a test make an earlier request
/// resolve after a later one.
struct DelayedStore {
    listing: Mutex<Vec<Task>>,
    status_delays_ms: Mutex<VecDeque<u64>>,
}

impl DelayedStore {
    fn new(listing: Vec<Task>, delays_ms: Vec<u64>) -> Self {
        Self {
            listing: Mutex::new(listing),
            status_delays_ms: Mutex::new(delays_ms.into()),
        }
    }
}

#[async_trait]
impl TaskStore for DelayedStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.listing.lock().unwrap().clone())
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        Ok(make_task("created", &draft.title, draft.status))
    }

    async fn update_task(&self, id: &str, _patch: &TaskPatch) -> Result<Task, ApiError> {
        Ok(make_task(id, "echo", TaskStatus::Todo))
    }

    async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ApiError> {
        let delay = self.status_delays_ms.lock().unwrap().pop_front().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(make_task(id, "echo", status))
    }

    async fn update_subtask_status(
        &self,
        id: &str,
        _subtask_id: &str,
        _status: TaskStatus,
    ) -> Result<Task, ApiError> {
        Ok(make_task(id, "echo", TaskStatus::Todo))
    }

    async fn delete_task(&self, _id: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

/// AI service that blocks until released, then returns two subtasks
struct GatedAi {
    gate: Notify,
    fail: AtomicBool,
}

impl GatedAi {
    fn new() -> Self {
        Self {
            gate: Notify::new(),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AiService for GatedAi {
    async fn generate_subtasks(&self, task_id: &str, title: &str) -> Result<Task, ApiError> {
        self.gate.notified().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 503,
                message: "ai unavailable".to_string(),
            });
        }
        let mut task = make_task(task_id, title, TaskStatus::Todo);
        task.subtasks = vec![
            make_subtask("s1", "First step", TaskStatus::Todo),
            make_subtask("s2", "Second step", TaskStatus::Todo),
        ];
        Ok(task)
    }

    async fn generate_description(&self, title: &str) -> Result<String, ApiError> {
        Ok(format!("Description for {}", title))
    }
}

/// AI stub for tests that never touch the AI path
struct NoopAi;

#[async_trait]
impl AiService for NoopAi {
    async fn generate_subtasks(&self, _task_id: &str, _title: &str) -> Result<Task, ApiError> {
        Err(ApiError::InvalidResponse("not scripted".to_string()))
    }

    async fn generate_description(&self, _title: &str) -> Result<String, ApiError> {
        Err(ApiError::InvalidResponse("not scripted".to_string()))
    }
}

// =============================================================================
// Optimistic visibility
// =============================================================================

#[tokio::test]
async fn test_status_is_visible_before_network_completion() {
    let store = Arc::new(GatedStore::new(vec![make_task("t1", "Buy milk", TaskStatus::Todo)]));
    let manager = Arc::new(TaskListManager::new(store.clone(), Arc::new(NoopAi)));
    manager.load_all().await.unwrap();

    let mutation = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.set_status("t1", TaskStatus::Completed).await })
    };

    // Let the mutation task run up to its suspension point
    tokio::time::sleep(Duration::from_millis(20)).await;

    // The request is still gated, yet the mirror already reflects intent
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Completed);

    store.release_one();
    mutation.await.unwrap().unwrap();

    // Confirmation retains the state the mirror already showed
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Completed);
}

// =============================================================================
// Stale responses under racing mutations
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_last_intent_wins_when_earlier_response_arrives_later() {
    // First status request resolves after 80ms, second after 10ms: the
    // earlier request's echo arrives last and must be discarded.
    let store = Arc::new(DelayedStore::new(
        vec![make_task("t1", "Buy milk", TaskStatus::Todo)],
        vec![80, 10],
    ));
    let manager = Arc::new(TaskListManager::new(store, Arc::new(NoopAi)));
    manager.load_all().await.unwrap();

    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.set_status("t1", TaskStatus::InProgress).await })
    };
    // Make sure the first mutation is issued before the second
    tokio::time::sleep(Duration::from_millis(1)).await;
    let second = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.set_status("t1", TaskStatus::Completed).await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // Without sequencing this would read in-progress (lost update)
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_rejection_does_not_roll_back() {
    // The first mutation fails slowly; a second mutation for the same task
    // is issued meanwhile. The late rejection must not restore the
    // snapshot over the newer intent.
    struct FailFirstStore {
        listing: Mutex<Vec<Task>>,
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl TaskStore for FailFirstStore {
        async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
            Ok(self.listing.lock().unwrap().clone())
        }

        async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
            Ok(make_task("created", &draft.title, draft.status))
        }

        async fn update_task(&self, id: &str, _patch: &TaskPatch) -> Result<Task, ApiError> {
            Ok(make_task(id, "echo", TaskStatus::Todo))
        }

        async fn update_task_status(&self, id: &str, status: TaskStatus) -> Result<Task, ApiError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                // First call: slow failure
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Err(ApiError::Status {
                    status: 500,
                    message: "first call fails".to_string(),
                });
            }
            Ok(make_task(id, "echo", status))
        }

        async fn update_subtask_status(
            &self,
            id: &str,
            _subtask_id: &str,
            _status: TaskStatus,
        ) -> Result<Task, ApiError> {
            Ok(make_task(id, "echo", TaskStatus::Todo))
        }

        async fn delete_task(&self, _id: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    let store = Arc::new(FailFirstStore {
        listing: Mutex::new(vec![make_task("t1", "Buy milk", TaskStatus::Todo)]),
        failed_once: AtomicBool::new(false),
    });
    let manager = Arc::new(TaskListManager::new(store, Arc::new(NoopAi)));
    manager.load_all().await.unwrap();

    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.set_status("t1", TaskStatus::InProgress).await })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    let second = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.set_status("t1", TaskStatus::Completed).await })
    };

    assert!(first.await.unwrap().is_err());
    second.await.unwrap().unwrap();

    // The rejected first mutation was superseded; the newer intent stands.
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Completed);
}

// =============================================================================
// Reload-during-mutation race (inherent to replace-wholesale)
// =============================================================================

#[tokio::test]
async fn test_load_all_supersedes_unconfirmed_optimistic_edit() {
    let store = Arc::new(GatedStore::new(vec![make_task("t1", "Buy milk", TaskStatus::Todo)]));
    let manager = Arc::new(TaskListManager::new(store.clone(), Arc::new(NoopAi)));
    manager.load_all().await.unwrap();

    let mutation = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.set_status("t1", TaskStatus::Completed).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Completed);

    // A full refetch interleaves while the mutation is unconfirmed: the
    // server still says todo, and replace-wholesale takes its word.
    manager.load_all().await.unwrap();
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Todo);

    // Once the mutation confirms, its echo is still the latest intent for
    // the entity and is committed over the reloaded state.
    store.release_one();
    mutation.await.unwrap().unwrap();
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::Completed);
}

// =============================================================================
// Rollback and events
// =============================================================================

#[tokio::test]
async fn test_rejected_mutation_restores_snapshot_and_signals() {
    struct FailingStore {
        listing: Mutex<Vec<Task>>,
    }

    #[async_trait]
    impl TaskStore for FailingStore {
        async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
            Ok(self.listing.lock().unwrap().clone())
        }

        async fn create_task(&self, _draft: &TaskDraft) -> Result<Task, ApiError> {
            Err(ApiError::Status {
                status: 500,
                message: "nope".to_string(),
            })
        }

        async fn update_task(&self, _id: &str, _patch: &TaskPatch) -> Result<Task, ApiError> {
            Err(ApiError::Status {
                status: 500,
                message: "nope".to_string(),
            })
        }

        async fn update_task_status(&self, _id: &str, _status: TaskStatus) -> Result<Task, ApiError> {
            Err(ApiError::Status {
                status: 500,
                message: "nope".to_string(),
            })
        }

        async fn update_subtask_status(
            &self,
            _id: &str,
            _subtask_id: &str,
            _status: TaskStatus,
        ) -> Result<Task, ApiError> {
            Err(ApiError::Status {
                status: 500,
                message: "nope".to_string(),
            })
        }

        async fn delete_task(&self, _id: &str) -> Result<(), ApiError> {
            Err(ApiError::Status {
                status: 500,
                message: "nope".to_string(),
            })
        }
    }

    let mut parent = make_task("t1", "Trip", TaskStatus::InProgress);
    parent.subtasks = vec![make_subtask("s1", "Flights", TaskStatus::Todo)];
    let store = Arc::new(FailingStore {
        listing: Mutex::new(vec![parent]),
    });
    let manager = TaskListManager::new(store, Arc::new(NoopAi));
    manager.load_all().await.unwrap();
    // Subscribed after the load, so only mutation events arrive below
    let mut events = manager.subscribe();

    // Task status rollback
    assert!(manager.set_status("t1", TaskStatus::Completed).await.is_err());
    assert_eq!(manager.task("t1").unwrap().status, TaskStatus::InProgress);

    // Subtask status rollback
    assert!(
        manager
            .set_subtask_status("t1", "s1", TaskStatus::Completed)
            .await
            .is_err()
    );
    assert_eq!(
        manager.task("t1").unwrap().subtask("s1").unwrap().status,
        TaskStatus::Todo
    );

    // Delete rollback
    assert!(manager.remove("t1").await.is_err());
    assert_eq!(manager.snapshot().len(), 1);

    // Every failed mutation produced a visible failure signal
    let mut failures = 0;
    while let Ok(event) = events.try_recv() {
        if event.event_type() == "MutationFailed" {
            failures += 1;
        }
    }
    assert_eq!(failures, 3);
}

// =============================================================================
// AI generation lifecycle
// =============================================================================

#[tokio::test]
async fn test_generating_indicator_spans_the_ai_call() {
    let mut task = make_task("t1", "Buy milk", TaskStatus::Todo);
    task.subtasks = vec![make_subtask("old", "Old", TaskStatus::Completed)];
    let store = Arc::new(GatedStore::new(vec![task]));
    // The store gate is irrelevant here; only the AI gate is used
    store.gated.store(false, Ordering::SeqCst);

    let ai = Arc::new(GatedAi::new());
    let manager = Arc::new(TaskListManager::new(store, ai.clone()));
    manager.load_all().await.unwrap();

    assert!(!manager.is_generating("t1"));

    let generation = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.generate_subtasks("t1", "Buy milk").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // In flight: indicator on, prior subtasks still visible
    assert!(manager.is_generating("t1"));
    assert_eq!(manager.task("t1").unwrap().subtasks[0].id, "old");

    ai.gate.notify_one();
    let subtasks = generation.await.unwrap().unwrap();
    assert_eq!(subtasks.len(), 2);

    // Resolved: indicator off, sequence replaced wholesale
    assert!(!manager.is_generating("t1"));
    let ids: Vec<String> = manager
        .task("t1")
        .unwrap()
        .subtasks
        .iter()
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(ids, vec!["s1", "s2"]);
}

#[tokio::test]
async fn test_generation_failure_clears_indicator_and_keeps_subtasks() {
    let mut task = make_task("t1", "Buy milk", TaskStatus::Todo);
    task.subtasks = vec![make_subtask("old", "Old", TaskStatus::Todo)];
    let store = Arc::new(GatedStore::new(vec![task]));
    store.gated.store(false, Ordering::SeqCst);

    let ai = Arc::new(GatedAi::new());
    ai.fail.store(true, Ordering::SeqCst);
    let manager = Arc::new(TaskListManager::new(store, ai.clone()));
    manager.load_all().await.unwrap();

    let generation = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.generate_subtasks("t1", "Buy milk").await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    ai.gate.notify_one();

    assert!(generation.await.unwrap().is_err());
    assert!(!manager.is_generating("t1"));
    assert_eq!(manager.task("t1").unwrap().subtasks[0].id, "old");
}

// =============================================================================
// Creation scenario
// =============================================================================

#[tokio::test]
async fn test_create_scenario_buy_milk() {
    let store = Arc::new(GatedStore::new(Vec::new()));
    store.gated.store(false, Ordering::SeqCst);
    let manager = TaskListManager::new(store, Arc::new(NoopAi));
    manager.load_all().await.unwrap();

    let draft = TaskDraft::new("Buy milk").with_priority(Priority::Low);
    let created = manager.create(draft).await.unwrap();

    assert_eq!(created.id, "created");
    let tasks = manager.snapshot();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].status, TaskStatus::Todo);
}
