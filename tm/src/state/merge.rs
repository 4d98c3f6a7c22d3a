//! Identity-preserving merge over the mirrored task collection
//!
//! Every mutation of the mirror goes through these helpers. They locate
//! targets by identifier equality (never by position) and rebuild the
//! collection as a structural copy: a fresh vector with a fresh entity at
//! the mutated slot, untouched entries cloned as-is. `None` means the
//! target is absent locally, which callers treat as a local no-op.

use taskclient::{Subtask, Task, TaskPatch};

/// Rebuild the collection with `f` applied to the task matching `id`
///
/// Returns `None` when no task has that identifier.
pub(crate) fn replace_task<F>(tasks: &[Task], id: &str, f: F) -> Option<Vec<Task>>
where
    F: FnOnce(&Task) -> Task,
{
    let index = tasks.iter().position(|t| t.id == id)?;
    let mut next: Vec<Task> = tasks.to_vec();
    next[index] = f(&tasks[index]);
    Some(next)
}

/// Rebuild the collection with `f` applied to one subtask
///
/// Locates the parent by identifier, then the subtask by identifier within
/// the parent's sequence, and reconstructs both levels. Returns `None` when
/// either identifier is absent.
pub(crate) fn replace_subtask<F>(
    tasks: &[Task],
    task_id: &str,
    subtask_id: &str,
    f: F,
) -> Option<Vec<Task>>
where
    F: FnOnce(&Subtask) -> Subtask,
{
    let task_index = tasks.iter().position(|t| t.id == task_id)?;
    let subtask_index = tasks[task_index].subtasks.iter().position(|s| s.id == subtask_id)?;

    let mut next: Vec<Task> = tasks.to_vec();
    let mut parent = tasks[task_index].clone();
    parent.subtasks[subtask_index] = f(&tasks[task_index].subtasks[subtask_index]);
    next[task_index] = parent;
    Some(next)
}

/// Append a server-confirmed task to the end of the collection
pub(crate) fn append_task(tasks: &[Task], task: Task) -> Vec<Task> {
    let mut next: Vec<Task> = tasks.to_vec();
    next.push(task);
    next
}

/// Remove the task matching `id`
///
/// Returns `None` when the identifier is already absent, making removal
/// idempotent at the call site.
pub(crate) fn remove_task(tasks: &[Task], id: &str) -> Option<Vec<Task>> {
    tasks.iter().position(|t| t.id == id)?;
    Some(tasks.iter().filter(|t| t.id != id).cloned().collect())
}

/// Restore one task from a snapshot taken before an optimistic mutation
///
/// If the task still exists in the current collection it is replaced with
/// the snapshot version; if it was optimistically removed it is reinserted
/// at its snapshot position (clamped to the current length). A task absent
/// from the snapshot leaves the collection unchanged.
pub(crate) fn restore_task(current: &[Task], snapshot: &[Task], id: &str) -> Vec<Task> {
    let Some(snapshot_index) = snapshot.iter().position(|t| t.id == id) else {
        return current.to_vec();
    };
    let restored = snapshot[snapshot_index].clone();

    match current.iter().position(|t| t.id == id) {
        Some(index) => {
            let mut next: Vec<Task> = current.to_vec();
            next[index] = restored;
            next
        }
        None => {
            let mut next: Vec<Task> = current.to_vec();
            next.insert(snapshot_index.min(next.len()), restored);
            next
        }
    }
}

/// Field-level merge of a patch into a task
///
/// Attributes not present in the patch are left untouched, the subtask
/// sequence included.
pub(crate) fn merge_patch(task: &Task, patch: &TaskPatch) -> Task {
    let mut next = task.clone();
    if let Some(title) = &patch.title {
        next.title = title.clone();
    }
    if let Some(description) = &patch.description {
        next.description = Some(description.clone());
    }
    if let Some(status) = patch.status {
        next.status = status;
    }
    if let Some(priority) = patch.priority {
        next.priority = priority;
    }
    if let Some(due_date) = patch.due_date {
        next.due_date = Some(due_date);
    }
    if let Some(start_date) = patch.start_date {
        next.start_date = Some(start_date);
    }
    if let Some(category) = &patch.category {
        next.category = Some(category.clone());
    }
    next
}

/// Reconcile a confirmed partial update against the server echo
///
/// Patched fields take the server's authoritative values; everything else
/// (the subtask sequence in particular) stays local. The update timestamp
/// always follows the server.
pub(crate) fn merge_echo(local: &Task, patch: &TaskPatch, echo: &Task) -> Task {
    let mut next = local.clone();
    if patch.title.is_some() {
        next.title = echo.title.clone();
    }
    if patch.description.is_some() {
        next.description = echo.description.clone();
    }
    if patch.status.is_some() {
        next.status = echo.status;
    }
    if patch.priority.is_some() {
        next.priority = echo.priority;
    }
    if patch.due_date.is_some() {
        next.due_date = echo.due_date;
    }
    if patch.start_date.is_some() {
        next.start_date = echo.start_date;
    }
    if patch.category.is_some() {
        next.category = echo.category.clone();
    }
    next.updated_at = echo.updated_at;
    next
}

/// Replace a task's subtask sequence wholesale
///
/// Used after AI generation, which is replacing rather than incremental.
pub(crate) fn replace_subtasks(tasks: &[Task], id: &str, subtasks: Vec<Subtask>) -> Option<Vec<Task>> {
    replace_task(tasks, id, |task| {
        let mut next = task.clone();
        next.subtasks = subtasks;
        next
    })
}
