use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Subcommand;
use tracing::info;

use crate::{
    storage::document_store::DocumentStore,
    tracker::checklists::{Checklist, ChecklistsDocument},
};

use super::{join_words, trimmed, Context};

#[derive(Debug, Subcommand)]
pub enum ChecklistsCommand {
    #[command(about = "Create an empty checklist", visible_alias = "new")]
    Create {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Add an item")]
    Add {
        #[arg(value_parser = trimmed)]
        name: String,
        #[arg(required = true)]
        text: Vec<String>,
    },
    #[command(about = "Check an item. Items are numbered from 1")]
    Check {
        #[arg(value_parser = trimmed)]
        name: String,
        number: usize,
    },
    #[command(about = "Uncheck an item")]
    Uncheck {
        #[arg(value_parser = trimmed)]
        name: String,
        number: usize,
    },
    #[command(about = "Remove an item")]
    Drop {
        #[arg(value_parser = trimmed)]
        name: String,
        number: usize,
    },
    #[command(about = "Uncheck every item")]
    Reset {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Items and progress of a checklist")]
    Show {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "List checklists with progress", visible_alias = "ls")]
    List,
    #[command(about = "Remove a checklist", visible_aliases = ["rm", "delete"])]
    Remove {
        #[arg(value_parser = trimmed)]
        name: String,
    },
    #[command(about = "Write a checklist into a JSON file")]
    Export {
        #[arg(value_parser = trimmed)]
        name: String,
        file: PathBuf,
    },
    #[command(about = "Add a checklist from a file made by export")]
    Import {
        file: PathBuf,
        #[arg(long, value_parser = trimmed, help = "Name to use instead of the exported one")]
        name: Option<String>,
    },
}

fn print_progress(checklist: &Checklist) {
    let (done, percentage) = checklist.progress();
    println!(
        "{}\t{done}/{}\t{percentage}",
        checklist.name,
        checklist.items.len()
    );
}

/// Command to process `checklists` commands.
pub async fn process_checklists_command(
    command: ChecklistsCommand,
    context: &Context,
) -> Result<()> {
    let store = &context.store;
    store.ensure::<ChecklistsDocument>().await?;

    match command {
        ChecklistsCommand::Create { name } => {
            let now = context.now_utc();
            store
                .update(|d: &mut ChecklistsDocument| Ok(d.create(&name, now)?))
                .await?;
            info!("Created checklist {name}");
            println!("Created checklist `{name}`");
        }
        ChecklistsCommand::Add { name, text } => {
            let number = store
                .update(|d: &mut ChecklistsDocument| Ok(d.add_item(&name, &join_words(&text))?))
                .await?;
            println!("Added item {number} to `{name}`");
        }
        ChecklistsCommand::Check { name, number } => {
            store
                .update(|d: &mut ChecklistsDocument| Ok(d.set_done(&name, number, true)?))
                .await?;
            println!("Checked item {number} of `{name}`");
        }
        ChecklistsCommand::Uncheck { name, number } => {
            store
                .update(|d: &mut ChecklistsDocument| Ok(d.set_done(&name, number, false)?))
                .await?;
            println!("Unchecked item {number} of `{name}`");
        }
        ChecklistsCommand::Drop { name, number } => {
            let item = store
                .update(|d: &mut ChecklistsDocument| Ok(d.remove_item(&name, number)?))
                .await?;
            println!("Removed `{}` from `{name}`", item.text);
        }
        ChecklistsCommand::Reset { name } => {
            let changed = store
                .update(|d: &mut ChecklistsDocument| Ok(d.reset(&name)?))
                .await?;
            println!("Unchecked {changed} items of `{name}`");
        }
        ChecklistsCommand::Show { name } => {
            let document = store.load::<ChecklistsDocument>().await?;
            let checklist = document.get(&name)?;
            print_progress(checklist);
            for (index, item) in checklist.items.iter().enumerate() {
                let marker = if item.done { "[x]" } else { "[ ]" };
                println!("{}\t{marker}\t{}", index + 1, item.text);
            }
        }
        ChecklistsCommand::List => {
            let document = store.load::<ChecklistsDocument>().await?;
            if document.checklists.is_empty() {
                println!("No checklists");
            }
            for checklist in &document.checklists {
                print_progress(checklist);
            }
        }
        ChecklistsCommand::Remove { name } => {
            store
                .update(|d: &mut ChecklistsDocument| Ok(d.remove(&name)?))
                .await?;
            println!("Removed checklist `{name}`");
        }
        ChecklistsCommand::Export { name, file } => {
            let document = store.load::<ChecklistsDocument>().await?;
            let checklist = document.get(&name)?;
            tokio::fs::write(&file, serde_json::to_vec_pretty(checklist)?)
                .await
                .with_context(|| format!("Failed to write {file:?}"))?;
            println!("Exported `{name}` to {}", file.display());
        }
        ChecklistsCommand::Import { file, name } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {file:?}"))?;
            let checklist: Checklist = serde_json::from_slice(&bytes)
                .with_context(|| format!("{file:?} is not a checklist export"))?;
            let (name, items) = store
                .update(|d: &mut ChecklistsDocument| {
                    let imported = d.import(checklist, name.as_deref())?;
                    Ok((imported.name.clone(), imported.items.len()))
                })
                .await?;
            info!("Imported checklist {name}");
            println!("Imported `{name}` with {items} items");
        }
    }
    Ok(())
}
