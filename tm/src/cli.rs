//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskclient::{Priority, TaskStatus};

/// taskmirror - optimistic task-list mirror over a remote task API
#[derive(Parser)]
#[command(name = "tm", about = "Task list client with optimistic local state", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all tasks with their subtasks
    List {
        /// Filter by status (todo, in-progress, completed)
        #[arg(short, long)]
        status: Option<TaskStatus>,
    },

    /// Create a task
    Create {
        /// Task title
        title: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Due date (RFC 3339, e.g. 2026-09-01T12:00:00Z)
        #[arg(long)]
        due: Option<String>,

        /// Category label
        #[arg(long)]
        category: Option<String>,
    },

    /// Set a task's status
    Status {
        /// Task ID
        id: String,

        /// New status (todo, in-progress, completed)
        status: TaskStatus,
    },

    /// Mark a task completed (shorthand for `status <id> completed`)
    Done {
        /// Task ID
        id: String,
    },

    /// Set a subtask's status
    SubtaskStatus {
        /// Parent task ID
        id: String,

        /// Subtask ID
        subtask_id: String,

        /// New status (todo, in-progress, completed)
        status: TaskStatus,
    },

    /// Update task fields
    Update {
        /// Task ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<Priority>,

        /// New due date (RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// New category label
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,
    },

    /// Generate subtasks for a task via the AI service
    Generate {
        /// Task ID
        id: String,
    },

    /// Generate a description from a title via the AI service
    Describe {
        /// Task title to describe
        title: String,
    },
}
