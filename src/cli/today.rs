use anyhow::Result;

use crate::{
    storage::document_store::DocumentStore,
    tracker::{
        habits::HabitsDocument, meetings::MeetingsDocument, tasks::TasksDocument,
        timelog::TimerDocument,
    },
    utils::time::format_minutes,
};

use super::Context;

/// Command to process `today`. Documents are read concurrently, each under its own lock.
pub async fn process_today_command(context: &Context) -> Result<()> {
    let store = &context.store;
    let (habits, tasks, timer, meetings) = tokio::try_join!(
        store.load::<HabitsDocument>(),
        store.load::<TasksDocument>(),
        store.load::<TimerDocument>(),
        store.load::<MeetingsDocument>(),
    )?;
    let today = context.today();

    println!("{}", today.format("%A, %d %B %Y"));

    let statuses = habits
        .status(today)
        .into_iter()
        .filter(|v| v.active)
        .collect::<Vec<_>>();
    if !statuses.is_empty() {
        let done = statuses.iter().filter(|v| v.done_today).count();
        println!();
        println!("Habits {done}/{}", statuses.len());
        for status in statuses {
            let marker = if status.done_today { "[x]" } else { "[ ]" };
            println!("{marker}\t{}\tstreak {}", status.name, status.streaks.current);
        }
    }

    let overdue = tasks.overdue(today);
    let due = tasks.due_on(today);
    if !overdue.is_empty() || !due.is_empty() {
        println!();
        println!("Tasks");
        for task in overdue {
            println!("{}\t{}\toverdue since {}", task.id, task.description, task.due.unwrap_or(today));
        }
        for task in due {
            println!("{}\t{}\tdue today", task.id, task.description);
        }
    }

    if let Some(timer) = timer.timer {
        println!();
        println!(
            "Timer\t{}\t{}",
            timer.project,
            format_minutes(timer.elapsed_minutes(context.now_utc()) as u64)
        );
    }

    let actions = meetings.open_actions();
    if !actions.is_empty() {
        println!();
        println!("Open action items");
        for action in actions {
            println!(
                "{}/{}\t{}\t{}",
                action.meeting.id, action.number, action.item.text, action.meeting.title
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::cli::testing::{context_at, noon, run};

    #[tokio::test]
    async fn test_today_on_empty_dir() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["today"]).await?;
        // reading doesn't create documents
        assert!(!dir.path().join("data/habits.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_today_with_data() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["habits", "add", "read"]).await?;
        run(&context, &["habits", "check", "read"]).await?;
        run(&context, &["tasks", "add", "late", "--due", "2025-03-01"]).await?;
        run(&context, &["tasks", "add", "now", "--due", "today"]).await?;
        run(&context, &["time", "start", "client"]).await?;
        run(&context, &["meetings", "new", "sync"]).await?;
        run(&context, &["meetings", "action", "1", "recap"]).await?;
        run(&context, &["today"]).await?;
        Ok(())
    }
}
