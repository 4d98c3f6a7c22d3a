//! taskmirror - CLI entry point
//!
//! Wires the HTTP store and AI clients from config into a
//! TaskListManager and drives it from the command line.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use taskclient::{AiService, HttpAiClient, HttpTaskStore, Task, TaskDraft, TaskPatch, TaskStatus, TaskStore};
use taskmirror::cli::{Cli, Command};
use taskmirror::config::Config;
use taskmirror::state::TaskListManager;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > default (WARN, stderr)
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to WARN", s);
                tracing::Level::WARN
            }
        },
        None => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn parse_due(due: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(due).context(format!("Invalid RFC 3339 date: {}", due))?;
    Ok(parsed.with_timezone(&Utc))
}

fn status_marker(status: TaskStatus) -> colored::ColoredString {
    match status {
        TaskStatus::Todo => "○".normal(),
        TaskStatus::InProgress => "◐".yellow(),
        TaskStatus::Completed => "✓".green(),
    }
}

fn print_task(task: &Task) {
    let title = if task.is_completed() {
        task.title.dimmed().strikethrough()
    } else {
        task.title.normal()
    };
    let mut line = format!("{} {} {}", status_marker(task.status), task.id.cyan(), title);
    line.push_str(&format!(" [{}]", task.priority));
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", due.format("%Y-%m-%d")));
    }
    if let Some(category) = &task.category {
        line.push_str(&format!(" #{}", category));
    }
    println!("{}", line);

    for subtask in &task.subtasks {
        println!(
            "    {} {} {}",
            status_marker(subtask.status),
            subtask.id.cyan(),
            subtask.title
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;
    config.validate().context("Invalid configuration")?;

    let store: Arc<dyn TaskStore> = Arc::new(HttpTaskStore::from_config(&config.api)?);
    let ai: Arc<dyn AiService> = Arc::new(HttpAiClient::from_config(&config.api)?);
    let manager = TaskListManager::new(store, ai);

    debug!("main: dispatching command");
    match cli.command {
        Command::List { status } => {
            let tasks = manager.load_all().await.context("Failed to fetch tasks")?;
            let mut shown = 0usize;
            for task in tasks.iter() {
                if status.is_none_or(|s| task.status == s) {
                    print_task(task);
                    shown += 1;
                }
            }
            if shown == 0 {
                println!("{}", "No tasks".dimmed());
            }
        }

        Command::Create {
            title,
            description,
            priority,
            due,
            category,
        } => {
            let mut draft = TaskDraft::new(title);
            if let Some(description) = description {
                draft = draft.with_description(description);
            }
            if let Some(priority) = priority {
                draft = draft.with_priority(priority);
            }
            if let Some(due) = due {
                draft = draft.with_due_date(parse_due(&due)?);
            }
            if let Some(category) = category {
                draft = draft.with_category(category);
            }

            let created = manager.create(draft).await.context("Failed to create task")?;
            println!("{} Created task {}", "✓".green(), created.id.cyan());
        }

        Command::Status { id, status } => {
            manager.load_all().await.context("Failed to fetch tasks")?;
            manager
                .set_status(&id, status)
                .await
                .context("Failed to update status")?;
            println!("{} {} -> {}", "✓".green(), id.cyan(), status);
        }

        Command::Done { id } => {
            manager.load_all().await.context("Failed to fetch tasks")?;
            manager
                .set_status(&id, TaskStatus::Completed)
                .await
                .context("Failed to update status")?;
            println!("{} {} -> completed", "✓".green(), id.cyan());
        }

        Command::SubtaskStatus { id, subtask_id, status } => {
            manager.load_all().await.context("Failed to fetch tasks")?;
            manager
                .set_subtask_status(&id, &subtask_id, status)
                .await
                .context("Failed to update subtask status")?;
            println!("{} {}/{} -> {}", "✓".green(), id.cyan(), subtask_id.cyan(), status);
        }

        Command::Update {
            id,
            title,
            description,
            priority,
            due,
            category,
        } => {
            let mut patch = TaskPatch::new();
            if let Some(title) = title {
                patch = patch.with_title(title);
            }
            if let Some(description) = description {
                patch = patch.with_description(description);
            }
            if let Some(priority) = priority {
                patch = patch.with_priority(priority);
            }
            if let Some(due) = due {
                patch = patch.with_due_date(parse_due(&due)?);
            }
            if let Some(category) = category {
                patch = patch.with_category(category);
            }

            manager.load_all().await.context("Failed to fetch tasks")?;
            manager.update(&id, patch).await.context("Failed to update task")?;
            println!("{} Updated {}", "✓".green(), id.cyan());
        }

        Command::Rm { id } => {
            manager.load_all().await.context("Failed to fetch tasks")?;
            manager.remove(&id).await.context("Failed to delete task")?;
            println!("{} Deleted {}", "✓".green(), id.cyan());
        }

        Command::Generate { id } => {
            manager.load_all().await.context("Failed to fetch tasks")?;
            let title = manager
                .task(&id)
                .map(|t| t.title)
                .ok_or_else(|| eyre::eyre!("Task {} not found", id))?;

            println!("{} Generating subtasks for {}...", "◐".yellow(), id.cyan());
            let subtasks = manager
                .generate_subtasks(&id, &title)
                .await
                .context("Failed to generate subtasks")?;

            println!("{} Generated {} subtasks:", "✓".green(), subtasks.len());
            for subtask in &subtasks {
                println!("    {} {} {}", status_marker(subtask.status), subtask.id.cyan(), subtask.title);
            }
        }

        Command::Describe { title } => {
            let description = manager
                .generate_description(&title)
                .await
                .context("Failed to generate description")?;
            println!("{}", description);
        }
    }

    Ok(())
}
