//! Domain types for the task API
//!
//! These structs mirror the wire representation the remote store speaks:
//! camelCase field names, `_id` identifiers, kebab-case status values.
//! Everything downstream of the envelope adapter operates on these shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task or subtask completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    Todo,
    /// Work underway
    InProgress,
    /// Done
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "todo"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown status '{}' (expected todo, in-progress, completed)", other)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{}' (expected low, medium, high)", other)),
        }
    }
}

/// A decomposed unit of a task
///
/// Subtasks live by-value inside their parent's `subtasks` sequence; the
/// parent's sequence is the sole authoritative location. Identifiers are
/// unique within the parent and stable once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    /// Server-assigned identifier, unique within the parent task
    #[serde(rename = "_id")]
    pub id: String,

    /// Subtask title
    pub title: String,

    /// Completion status, independent of the parent's status
    #[serde(default)]
    pub status: TaskStatus,

    /// Optional priority
    #[serde(default)]
    pub priority: Option<Priority>,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last-update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A unit of work owned by a user
///
/// The identifier is assigned by the remote store on creation and never
/// changes afterwards. The subtask sequence is always present (an absent
/// wire field deserializes to an empty vec) so downstream mapping is total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Server-assigned stable identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Task title (non-empty)
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,

    /// Completion status
    #[serde(default)]
    pub status: TaskStatus,

    /// Priority
    #[serde(default)]
    pub priority: Priority,

    /// Due date
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,

    /// Start date
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Free-form category label
    #[serde(default)]
    pub category: Option<String>,

    /// Ordered subtask sequence, insertion order preserved
    #[serde(default)]
    pub subtasks: Vec<Subtask>,

    /// Owning user reference
    #[serde(default)]
    pub user: String,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last-update timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Find a subtask by identifier
    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Input for creating a task
///
/// Status defaults to `todo`; omitted optional fields are left off the wire
/// so the server applies its own defaults.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaskDraft {
    /// Create a draft with the given title and `todo` status
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: None,
            due_date: None,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Partial update for a task
///
/// `None` fields are skipped on the wire and left untouched by the local
/// merge. The subtask sequence is deliberately not patchable through this
/// type; subtasks change only via status updates or wholesale generation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field is set (nothing to send)
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.start_date.is_none()
            && self.category.is_none()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
