use anyhow::Result;
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use tracing::info;

use crate::{
    error::TrackerError,
    storage::document_store::DocumentStore,
    tracker::tasks::{Priority, Task, TasksDocument},
};

use super::{join_words, Context};

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    #[command(about = "Add a task")]
    Add {
        #[arg(required = true)]
        description: Vec<String>,
        #[arg(long, short, help = "Priority of the task")]
        priority: Option<Priority>,
        #[arg(long, help = "Due day. Examples are \"tomorrow\", \"2025-03-20\", \"friday\"")]
        due: Option<String>,
    },
    #[command(about = "Pending tasks, then completed ones", visible_alias = "ls")]
    List {
        #[arg(long, short, help = "Show every completed task, not only the latest ones")]
        all: bool,
    },
    #[command(about = "Mark a task done", visible_alias = "complete")]
    Done { id: u64 },
    #[command(about = "Mark a task pending again", visible_alias = "reopen")]
    Undone { id: u64 },
    #[command(about = "Remove a task", visible_aliases = ["rm", "delete"])]
    Remove { id: u64 },
    #[command(about = "Change the description of a task")]
    Edit {
        id: u64,
        #[arg(required = true)]
        description: Vec<String>,
    },
    #[command(about = "Set priority: high, medium, low or none")]
    Priority { id: u64, priority: String },
    #[command(about = "Set due day, `none` clears it")]
    Due { id: u64, due: String },
    #[command(about = "Search task descriptions")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    #[command(about = "Pending tasks past their due day")]
    Overdue,
    #[command(about = "Remove completed tasks")]
    Clear,
}

/// Completed tasks `list` shows without `--all`.
const RECENT_COMPLETED: usize = 5;

fn parse_priority(input: &str) -> Result<Option<Priority>, TrackerError> {
    if input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Priority::from_str(input, true)
        .map(Some)
        .map_err(|_| TrackerError::invalid("priority", format!("`{input}`")))
}

fn parse_due(input: &str, context: &Context) -> Result<Option<NaiveDate>, TrackerError> {
    if input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    context.parse_day(input).map(Some)
}

fn print_task(task: &Task, today: NaiveDate) {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    let priority = task.priority.map(|v| v.to_string()).unwrap_or_default();
    let due = match task.due {
        Some(due) if task.is_overdue(today) => format!("due {due} (overdue)"),
        Some(due) => format!("due {due}"),
        None => String::new(),
    };
    println!(
        "{}\t{marker}\t{}\t{priority}\t{due}",
        task.id, task.description
    );
}

/// Command to process `tasks` commands.
pub async fn process_tasks_command(command: TasksCommand, context: &Context) -> Result<()> {
    let store = &context.store;
    store.ensure::<TasksDocument>().await?;
    let today = context.today();

    match command {
        TasksCommand::Add {
            description,
            priority,
            due,
        } => {
            let due = due.as_deref().map(|v| context.parse_day(v)).transpose()?;
            let now = context.now_utc();
            let id = store
                .update(|d: &mut TasksDocument| {
                    Ok(d.add(&join_words(&description), priority, due, now)?.id)
                })
                .await?;
            info!("Added task {id}");
            println!("Added task {id}");
        }
        TasksCommand::List { all } => {
            let document = store.load::<TasksDocument>().await?;
            let listing = document.listing();
            if listing.pending.is_empty() {
                println!("Nothing to do");
            }
            for task in &listing.pending {
                print_task(task, today);
            }
            if !listing.completed.is_empty() {
                let shown = if all {
                    listing.completed.len()
                } else {
                    RECENT_COMPLETED.min(listing.completed.len())
                };
                println!();
                println!("Completed");
                for task in &listing.completed[listing.completed.len() - shown..] {
                    print_task(task, today);
                }
                if shown < listing.completed.len() {
                    println!(
                        "and {} more, use --all to show them",
                        listing.completed.len() - shown
                    );
                }
            }
        }
        TasksCommand::Done { id } => {
            let now = context.now_utc();
            let changed = store
                .update(|d: &mut TasksDocument| Ok(d.complete(id, now)?))
                .await?;
            if changed {
                println!("Completed task {id}");
            } else {
                println!("Task {id} was already completed");
            }
        }
        TasksCommand::Undone { id } => {
            let changed = store
                .update(|d: &mut TasksDocument| Ok(d.reopen(id)?))
                .await?;
            if changed {
                println!("Reopened task {id}");
            } else {
                println!("Task {id} is already pending");
            }
        }
        TasksCommand::Remove { id } => {
            let task = store
                .update(|d: &mut TasksDocument| Ok(d.remove(id)?))
                .await?;
            println!("Removed task {id}: {}", task.description);
        }
        TasksCommand::Edit { id, description } => {
            store
                .update(|d: &mut TasksDocument| Ok(d.edit(id, &join_words(&description))?))
                .await?;
            println!("Updated task {id}");
        }
        TasksCommand::Priority { id, priority } => {
            let priority = parse_priority(&priority)?;
            store
                .update(|d: &mut TasksDocument| Ok(d.set_priority(id, priority)?))
                .await?;
            match priority {
                Some(v) => println!("Task {id} priority is {v}"),
                None => println!("Cleared priority of task {id}"),
            }
        }
        TasksCommand::Due { id, due } => {
            let due = parse_due(&due, context)?;
            store
                .update(|d: &mut TasksDocument| Ok(d.set_due(id, due)?))
                .await?;
            match due {
                Some(v) => println!("Task {id} is due {v}"),
                None => println!("Cleared due day of task {id}"),
            }
        }
        TasksCommand::Search { query } => {
            let document = store.load::<TasksDocument>().await?;
            for task in document.search(&join_words(&query)) {
                print_task(task, today);
            }
        }
        TasksCommand::Overdue => {
            let document = store.load::<TasksDocument>().await?;
            let overdue = document.overdue(today);
            if overdue.is_empty() {
                println!("Nothing overdue");
            }
            for task in overdue {
                print_task(task, today);
            }
        }
        TasksCommand::Clear => {
            let removed = store
                .update(|d: &mut TasksDocument| Ok(d.clear_completed()))
                .await?;
            println!("Removed {removed} completed tasks");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::Duration;
    use tempfile::tempdir;

    use crate::{
        cli::testing::{context_at, noon, run},
        storage::document_store::DocumentStore,
        tracker::tasks::{Priority, TasksDocument},
    };

    #[tokio::test]
    async fn test_add_done_list() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["tasks", "add", "foo"]).await?;
        run(&context, &["tasks", "done", "1"]).await?;
        run(&context, &["tasks", "list"]).await?;

        let document = context.store.load::<TasksDocument>().await?;
        let task = document.get(1)?;
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(context.now_utc()));
        assert_eq!(document.listing().completed[0].id, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_with_options() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(
            &context,
            &["todo", "add", "buy", "milk", "-p", "high", "--due", "tomorrow"],
        )
        .await?;

        let document = context.store.load::<TasksDocument>().await?;
        let task = document.get(1)?;
        assert_eq!(task.description, "buy milk");
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.due, Some(context.today() + Duration::days(1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_priority_and_due_can_be_cleared() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["tasks", "add", "report", "-p", "low", "--due", "2025-03-01"]).await?;
        run(&context, &["tasks", "overdue"]).await?;
        run(&context, &["tasks", "priority", "1", "none"]).await?;
        run(&context, &["tasks", "due", "1", "none"]).await?;
        assert!(run(&context, &["tasks", "priority", "1", "urgent"]).await.is_err());

        let document = context.store.load::<TasksDocument>().await?;
        assert_eq!(document.get(1)?.priority, None);
        assert_eq!(document.get(1)?.due, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["tasks", "add", "one"]).await?;
        run(&context, &["tasks", "add", "two"]).await?;
        run(&context, &["tasks", "rm", "2"]).await?;
        run(&context, &["tasks", "add", "three"]).await?;
        run(&context, &["tasks", "complete", "1"]).await?;
        run(&context, &["tasks", "clear"]).await?;
        assert!(run(&context, &["tasks", "done", "2"]).await.is_err());

        let document = context.store.load::<TasksDocument>().await?;
        assert_eq!(
            document.tasks.iter().map(|v| v.id).collect::<Vec<_>>(),
            vec![3]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_and_reopen() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["tasks", "add", "draft"]).await?;
        run(&context, &["tasks", "edit", "1", "final", "draft"]).await?;
        run(&context, &["tasks", "done", "1"]).await?;
        run(&context, &["tasks", "reopen", "1"]).await?;
        run(&context, &["tasks", "search", "FINAL"]).await?;

        let document = context.store.load::<TasksDocument>().await?;
        let task = document.get(1)?;
        assert_eq!(task.description, "final draft");
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        Ok(())
    }
}
