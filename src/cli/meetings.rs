use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    storage::document_store::DocumentStore,
    tracker::meetings::{ActionItem, Meeting, MeetingsDocument},
};

use super::{join_words, Context};

#[derive(Debug, Subcommand)]
pub enum MeetingsCommand {
    #[command(about = "Start notes for a meeting", visible_aliases = ["add", "create"])]
    New {
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long, short, help = "Day of the meeting, today by default")]
        date: Option<String>,
        #[arg(long = "attendee", short, help = "Attendee, can be repeated")]
        attendees: Vec<String>,
    },
    #[command(about = "Add a note to a meeting")]
    Note {
        id: u64,
        #[arg(required = true)]
        text: Vec<String>,
    },
    #[command(about = "Add an action item to a meeting")]
    Action {
        id: u64,
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long, short, help = "Who is responsible")]
        owner: Option<String>,
    },
    #[command(about = "Mark an action item done. Items are numbered from 1")]
    Complete { id: u64, number: usize },
    #[command(about = "List meetings, newest first", visible_alias = "ls")]
    List,
    #[command(about = "Show notes and action items of a meeting")]
    Show { id: u64 },
    #[command(about = "Open action items across all meetings")]
    Actions,
    #[command(about = "Search titles, attendees, notes and action items")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    #[command(about = "Remove a meeting", visible_aliases = ["rm", "delete"])]
    Remove { id: u64 },
}

fn print_meeting_line(meeting: &Meeting) {
    let open = meeting.action_items.iter().filter(|v| !v.done).count();
    println!(
        "{}\t{}\t{}\t{} attendees\t{open} open actions",
        meeting.id,
        meeting.date,
        meeting.title,
        meeting.attendees.len()
    );
}

fn format_action(number: usize, item: &ActionItem) -> String {
    let marker = if item.done { "[x]" } else { "[ ]" };
    let owner = item
        .owner
        .as_ref()
        .map(|v| format!(" (@{v})"))
        .unwrap_or_default();
    format!("{number}\t{marker}\t{}{owner}", item.text)
}

/// Command to process `meetings` commands.
pub async fn process_meetings_command(command: MeetingsCommand, context: &Context) -> Result<()> {
    let store = &context.store;
    store.ensure::<MeetingsDocument>().await?;

    match command {
        MeetingsCommand::New {
            title,
            date,
            attendees,
        } => {
            let date = context.day_or_today(date.as_deref())?;
            let now = context.now_utc();
            let id = store
                .update(|d: &mut MeetingsDocument| {
                    Ok(d.create(&join_words(&title), date, &attendees, now)?.id)
                })
                .await?;
            info!("Created meeting {id}");
            println!("Created meeting {id} on {date}");
        }
        MeetingsCommand::Note { id, text } => {
            store
                .update(|d: &mut MeetingsDocument| Ok(d.add_note(id, &join_words(&text))?))
                .await?;
            println!("Added note to meeting {id}");
        }
        MeetingsCommand::Action { id, text, owner } => {
            let number = store
                .update(|d: &mut MeetingsDocument| {
                    Ok(d.add_action(id, &join_words(&text), owner.as_deref())?)
                })
                .await?;
            println!("Added action {number} to meeting {id}");
        }
        MeetingsCommand::Complete { id, number } => {
            let changed = store
                .update(|d: &mut MeetingsDocument| Ok(d.complete_action(id, number)?))
                .await?;
            if changed {
                println!("Completed action {number} of meeting {id}");
            } else {
                println!("Action {number} of meeting {id} was already done");
            }
        }
        MeetingsCommand::List => {
            let document = store.load::<MeetingsDocument>().await?;
            let meetings = document.listing();
            if meetings.is_empty() {
                println!("No meetings");
            }
            for meeting in meetings {
                print_meeting_line(meeting);
            }
        }
        MeetingsCommand::Show { id } => {
            let document = store.load::<MeetingsDocument>().await?;
            let meeting = document.get(id)?;
            println!("{} ({})", meeting.title, meeting.date);
            if !meeting.attendees.is_empty() {
                println!("Attendees: {}", meeting.attendees.join(", "));
            }
            if !meeting.notes.is_empty() {
                println!();
                println!("Notes");
                for note in &meeting.notes {
                    println!("- {note}");
                }
            }
            if !meeting.action_items.is_empty() {
                println!();
                println!("Action items");
                for (index, item) in meeting.action_items.iter().enumerate() {
                    println!("{}", format_action(index + 1, item));
                }
            }
        }
        MeetingsCommand::Actions => {
            let document = store.load::<MeetingsDocument>().await?;
            let open = document.open_actions();
            if open.is_empty() {
                println!("No open action items");
            }
            for action in open {
                println!(
                    "{}\t{}\t{}",
                    action.meeting.id,
                    action.meeting.title,
                    format_action(action.number, action.item)
                );
            }
        }
        MeetingsCommand::Search { query } => {
            let document = store.load::<MeetingsDocument>().await?;
            for meeting in document.search(&join_words(&query)) {
                print_meeting_line(meeting);
            }
        }
        MeetingsCommand::Remove { id } => {
            let meeting = store
                .update(|d: &mut MeetingsDocument| Ok(d.remove(id)?))
                .await?;
            println!("Removed meeting {id}: {}", meeting.title);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::{
        cli::testing::{context_at, noon, run},
        storage::document_store::DocumentStore,
        tracker::meetings::MeetingsDocument,
    };

    #[tokio::test]
    async fn test_meeting_flow() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(
            &context,
            &["meetings", "new", "Weekly", "sync", "-a", "Ana", "--attendee", "Bo"],
        )
        .await?;
        run(&context, &["meetings", "note", "1", "budget", "approved"]).await?;
        run(&context, &["meetings", "action", "1", "send", "recap", "--owner", "Ana"]).await?;
        run(&context, &["meetings", "action", "1", "book", "room"]).await?;
        run(&context, &["meetings", "complete", "1", "1"]).await?;
        run(&context, &["meetings", "show", "1"]).await?;
        run(&context, &["meetings", "actions"]).await?;
        run(&context, &["meetings", "search", "budget"]).await?;
        assert!(run(&context, &["meetings", "complete", "1", "3"]).await.is_err());

        let document = context.store.load::<MeetingsDocument>().await?;
        let meeting = document.get(1)?;
        assert_eq!(meeting.title, "Weekly sync");
        assert_eq!(meeting.date, context.today());
        assert_eq!(meeting.attendees, vec!["Ana", "Bo"]);
        assert_eq!(meeting.notes, vec!["budget approved"]);
        assert!(meeting.action_items[0].done);
        assert_eq!(meeting.action_items[0].owner.as_deref(), Some("Ana"));
        assert_eq!(document.open_actions().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["meetings", "create", "Planning", "--date", "2025-03-10"]).await?;
        run(&context, &["meetings", "ls"]).await?;
        run(&context, &["meetings", "rm", "1"]).await?;
        assert!(run(&context, &["meetings", "show", "1"]).await.is_err());
        Ok(())
    }
}
