use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use tracing::info;

use crate::{
    storage::document_store::DocumentStore,
    tracker::journal::{JournalDocument, JournalEntry, JournalExport},
};

use super::{join_words, Context};

#[derive(Debug, Subcommand)]
pub enum JournalCommand {
    #[command(about = "Write an entry", visible_alias = "add")]
    Write {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(long, short, help = "Mood from 1 to 5")]
        mood: Option<u8>,
        #[arg(long = "tag", short, help = "Tag of the entry, can be repeated")]
        tags: Vec<String>,
        #[arg(long, short, help = "Day of the entry, today by default")]
        date: Option<String>,
    },
    #[command(about = "Latest entries", visible_alias = "ls")]
    List {
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },
    #[command(about = "Entries of one day")]
    Show { date: String },
    #[command(about = "Search text and tags")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    #[command(about = "Remove an entry", visible_aliases = ["rm", "delete"])]
    Remove { id: u64 },
    #[command(about = "Entry count, streaks and average mood")]
    Stats,
    #[command(about = "Write every entry into a JSON file")]
    Export { file: PathBuf },
    #[command(about = "Add entries from a file made by export")]
    Import { file: PathBuf },
}

fn print_entry(entry: &JournalEntry) {
    let mood = entry.mood.map(|v| format!("mood {v}")).unwrap_or_default();
    let tags = entry
        .tags
        .iter()
        .map(|v| format!("#{v}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{}\t{}\t{}\t{mood}\t{tags}",
        entry.id, entry.date, entry.text
    );
}

/// Command to process `journal` commands.
pub async fn process_journal_command(command: JournalCommand, context: &Context) -> Result<()> {
    let store = &context.store;
    store.ensure::<JournalDocument>().await?;

    match command {
        JournalCommand::Write {
            text,
            mood,
            tags,
            date,
        } => {
            let date = context.day_or_today(date.as_deref())?;
            let now = context.now_utc();
            let id = store
                .update(|d: &mut JournalDocument| {
                    Ok(d.write(date, &join_words(&text), mood, &tags, now)?.id)
                })
                .await?;
            info!("Wrote journal entry {id}");
            println!("Wrote entry {id} for {date}");
        }
        JournalCommand::List { limit } => {
            let document = store.load::<JournalDocument>().await?;
            let entries = document.recent(limit);
            if entries.is_empty() {
                println!("Journal is empty");
            }
            for entry in entries {
                print_entry(entry);
            }
        }
        JournalCommand::Show { date } => {
            let date = context.parse_day(&date)?;
            let document = store.load::<JournalDocument>().await?;
            let entries = document.on_date(date);
            if entries.is_empty() {
                println!("No entries for {date}");
            }
            for entry in entries {
                print_entry(entry);
            }
        }
        JournalCommand::Search { query } => {
            let document = store.load::<JournalDocument>().await?;
            for entry in document.search(&join_words(&query)) {
                print_entry(entry);
            }
        }
        JournalCommand::Remove { id } => {
            store
                .update(|d: &mut JournalDocument| Ok(d.remove(id)?))
                .await?;
            println!("Removed entry {id}");
        }
        JournalCommand::Stats => {
            let document = store.load::<JournalDocument>().await?;
            let stats = document.stats(context.today());
            println!("Entries\t{}", stats.entries);
            println!("Days written\t{}", stats.days.total);
            println!("Current streak\t{}", stats.days.current);
            println!("Longest streak\t{}", stats.days.longest);
            match stats.average_mood {
                Some(v) => println!("Average mood\t{v:.1}"),
                None => println!("Average mood\t-"),
            }
        }
        JournalCommand::Export { file } => {
            let export = store.load::<JournalDocument>().await?.export();
            let count = export.entries.len();
            tokio::fs::write(&file, serde_json::to_vec_pretty(&export)?)
                .await
                .with_context(|| format!("Failed to write {file:?}"))?;
            println!("Exported {count} entries to {}", file.display());
        }
        JournalCommand::Import { file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {file:?}"))?;
            let export: JournalExport = serde_json::from_slice(&bytes)
                .with_context(|| format!("{file:?} is not a journal export"))?;
            let imported = store
                .update(|d: &mut JournalDocument| Ok(d.import(export)))
                .await?;
            info!("Imported {imported} journal entries");
            println!("Imported {imported} entries");
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
        tracker::journal::JournalDocument,
    };

    #[tokio::test]
    async fn test_write_with_options() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(
            &context,
            &[
                "journal", "write", "long", "walk", "--mood", "4", "--tag", "outside", "-t",
                "Health", "--date", "yesterday",
            ],
        )
        .await?;
        assert!(run(&context, &["journal", "write", "meh", "--mood", "9"])
            .await
            .is_err());

        let document = context.store.load::<JournalDocument>().await?;
        assert_eq!(document.entries.len(), 1);
        let entry = &document.entries[0];
        assert_eq!(entry.text, "long walk");
        assert_eq!(entry.mood, Some(4));
        assert_eq!(entry.tags, vec!["health", "outside"]);
        assert_eq!(entry.date, context.today().pred_opt().unwrap());
        Ok(())
    }

    #[tokio::test]
    async fn test_export_import_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["journal", "add", "first"]).await?;
        run(&context, &["journal", "add", "second", "-t", "work"]).await?;
        let file = dir.path().join("journal-export.json");
        let file = file.to_str().unwrap();
        run(&context, &["journal", "export", file]).await?;

        let other_dir = tempdir()?;
        let other = context_at(other_dir.path(), noon())?;
        run(&other, &["journal", "import", file]).await?;
        run(&other, &["journal", "import", file]).await?;

        let original = context.store.load::<JournalDocument>().await?;
        let restored = other.store.load::<JournalDocument>().await?;
        assert_eq!(
            restored.entries.iter().map(|v| &v.text).collect::<Vec<_>>(),
            original.entries.iter().map(|v| &v.text).collect::<Vec<_>>()
        );
        assert_eq!(restored.entries[1].tags, vec!["work"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_queries_and_remove() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        run(&context, &["journal", "write", "quiet", "day"]).await?;
        run(&context, &["journal", "list", "-n", "5"]).await?;
        run(&context, &["journal", "show", "today"]).await?;
        run(&context, &["journal", "search", "QUIET"]).await?;
        run(&context, &["journal", "stats"]).await?;
        run(&context, &["journal", "rm", "1"]).await?;
        assert!(run(&context, &["journal", "rm", "1"]).await.is_err());
        assert!(context
            .store
            .load::<JournalDocument>()
            .await?
            .entries
            .is_empty());
        Ok(())
    }
}
