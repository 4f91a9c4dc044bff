use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    storage::document_store::DocumentStore,
    tracker::habits::{HabitStatus, HabitsDocument},
};

use super::{join_words, trimmed, Context};

#[derive(Debug, Subcommand)]
pub enum HabitsCommand {
    #[command(about = "Add a new habit", visible_alias = "create")]
    Add {
        #[arg(value_parser = trimmed)]
        name: String,
        #[arg(long, help = "Times per week the habit should be done, 1 to 7")]
        weekly: Option<u32>,
    },
    #[command(about = "Remove a habit with its history", visible_aliases = ["rm", "delete"])]
    Remove {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Rename a habit keeping its history", visible_alias = "mv")]
    Rename {
        #[arg(value_parser = trimmed)]
        old: String,
        #[arg(value_parser = trimmed)]
        new: String,
    },
    #[command(
        about = "Mark a habit done. Without a name shows today's status",
        visible_alias = "done"
    )]
    Check {
        #[arg(value_parser = trimmed)]
        name: Option<String>,
        #[arg(long, short, help = "Day to check. Examples are \"yesterday\", \"2025-03-14\"")]
        date: Option<String>,
    },
    #[command(about = "Remove a completion", visible_alias = "undo")]
    Uncheck {
        #[arg(value_parser = trimmed)]
        name: String,
        #[arg(long, short, help = "Day to uncheck, today by default")]
        date: Option<String>,
    },
    #[command(about = "List habits with streaks and weekly progress", visible_alias = "ls")]
    List,
    #[command(about = "Current and longest streak of a habit")]
    Streak {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Completion rate of active habits")]
    Stats {
        #[arg(long, default_value_t = 30, help = "Number of days to look back")]
        days: u32,
    },
    #[command(about = "Attach a note to a habit")]
    Note {
        #[arg(value_parser = trimmed)]
        name: String,
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long, short, help = "Day of the note, today by default")]
        date: Option<String>,
    },
    #[command(about = "Show notes of a habit")]
    Notes {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Stop tracking a habit without losing its history")]
    Archive {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Track an archived habit again")]
    Activate {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Set the weekly target. Without a value clears it")]
    Target {
        #[arg(value_parser = trimmed)]
        name: String,
        target: Option<u32>,
    },
}

fn print_status(statuses: &[HabitStatus]) {
    if statuses.is_empty() {
        println!("No habits yet");
        return;
    }
    for status in statuses {
        let marker = match (status.active, status.done_today) {
            (false, _) => "[-]",
            (true, true) => "[x]",
            (true, false) => "[ ]",
        };
        let week = match status.weekly_target {
            Some(target) => format!("{}/{target} this week", status.done_this_week),
            None => format!("{} this week", status.done_this_week),
        };
        println!(
            "{marker}\t{}\tstreak {}\t{week}",
            status.name, status.streaks.current
        );
    }
}

/// Command to process `habits` commands.
pub async fn process_habits_command(command: HabitsCommand, context: &Context) -> Result<()> {
    let store = &context.store;
    store.ensure::<HabitsDocument>().await?;
    let today = context.today();

    match command {
        HabitsCommand::Add { name, weekly } => {
            let name = store
                .update(|d: &mut HabitsDocument| Ok(d.add(&name, weekly, today)?.name.clone()))
                .await?;
            info!("Added habit {name}");
            println!("Added habit `{name}`");
        }
        HabitsCommand::Remove { name } => {
            store
                .update(|d: &mut HabitsDocument| Ok(d.remove(&name)?))
                .await?;
            info!("Removed habit {name}");
            println!("Removed habit `{name}`");
        }
        HabitsCommand::Rename { old, new } => {
            store
                .update(|d: &mut HabitsDocument| Ok(d.rename(&old, &new)?))
                .await?;
            println!("Renamed `{old}` to `{new}`");
        }
        HabitsCommand::Check { name: None, .. } => {
            let document = store.load::<HabitsDocument>().await?;
            print_status(&document.status(today));
        }
        HabitsCommand::Check {
            name: Some(name),
            date,
        } => {
            let date = context.day_or_today(date.as_deref())?;
            let (added, streak) = store
                .update(|d: &mut HabitsDocument| {
                    let added = d.check(&name, date)?;
                    Ok((added, d.streaks(&name, today)?.current))
                })
                .await?;
            if added {
                println!("Checked `{name}` for {date}, current streak {streak}");
            } else {
                println!("`{name}` was already checked for {date}");
            }
        }
        HabitsCommand::Uncheck { name, date } => {
            let date = context.day_or_today(date.as_deref())?;
            let removed = store
                .update(|d: &mut HabitsDocument| Ok(d.uncheck(&name, date)?))
                .await?;
            if removed {
                println!("Unchecked `{name}` for {date}");
            } else {
                println!("`{name}` wasn't checked for {date}");
            }
        }
        HabitsCommand::List => {
            let document = store.load::<HabitsDocument>().await?;
            print_status(&document.status(today));
        }
        HabitsCommand::Streak { name } => {
            let document = store.load::<HabitsDocument>().await?;
            let streaks = document.streaks(&name, today)?;
            println!("Current streak\t{}", streaks.current);
            println!("Longest streak\t{}", streaks.longest);
            println!("Total days\t{}", streaks.total);
        }
        HabitsCommand::Stats { days } => {
            let document = store.load::<HabitsDocument>().await?;
            for habit in document.habits.iter().filter(|v| v.active) {
                let rate = document.completion_rate(&habit.name, today, days)?;
                println!("{}\t{rate}\tlast {days} days", habit.name);
            }
        }
        HabitsCommand::Note { name, text, date } => {
            let date = context.day_or_today(date.as_deref())?;
            let now = context.now_utc();
            store
                .update(|d: &mut HabitsDocument| {
                    Ok(d.add_note(&name, date, &join_words(&text), now)?)
                })
                .await?;
            println!("Added note to `{name}`");
        }
        HabitsCommand::Notes { name } => {
            let document = store.load::<HabitsDocument>().await?;
            let notes = document.notes_for(&name)?;
            if notes.is_empty() {
                println!("No notes for `{name}`");
            }
            for note in notes {
                println!("{}\t{}", note.date, note.note);
            }
        }
        HabitsCommand::Archive { name } => {
            let changed = store
                .update(|d: &mut HabitsDocument| Ok(d.set_active(&name, false)?))
                .await?;
            if changed {
                println!("Archived `{name}`");
            } else {
                println!("`{name}` is already archived");
            }
        }
        HabitsCommand::Activate { name } => {
            let changed = store
                .update(|d: &mut HabitsDocument| Ok(d.set_active(&name, true)?))
                .await?;
            if changed {
                println!("Activated `{name}`");
            } else {
                println!("`{name}` is already active");
            }
        }
        HabitsCommand::Target { name, target } => {
            store
                .update(|d: &mut HabitsDocument| Ok(d.set_target(&name, target)?))
                .await?;
            match target {
                Some(v) => println!("`{name}` target is {v} per week"),
                None => println!("Cleared target of `{name}`"),
            }
        }
    }
    Ok(())
}
