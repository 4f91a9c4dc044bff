use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    storage::document_store::DocumentStore,
    tracker::retro::{RetroCategory, RetrosDocument},
};

use super::{join_words, Context};

#[derive(Debug, Subcommand)]
pub enum RetroCommand {
    #[command(about = "Start a retrospective", visible_alias = "create")]
    New {
        #[arg(required = true)]
        title: Vec<String>,
        #[arg(long, short, help = "Day of the retrospective, today by default")]
        date: Option<String>,
    },
    #[command(about = "Add an item: went-well, to-improve or action")]
    Add {
        id: u64,
        category: RetroCategory,
        #[arg(required = true)]
        text: Vec<String>,
    },
    #[command(about = "Vote for an item. Items are numbered from 1")]
    Vote { id: u64, number: usize },
    #[command(about = "Remove an item")]
    Drop { id: u64, number: usize },
    #[command(about = "List retrospectives, newest first", visible_alias = "ls")]
    List,
    #[command(about = "Items grouped by category, most voted first")]
    Show { id: u64 },
    #[command(about = "Remove a retrospective", visible_aliases = ["rm", "delete"])]
    Remove { id: u64 },
}

/// Command to process `retro` commands.
pub async fn process_retro_command(command: RetroCommand, context: &Context) -> Result<()> {
    let store = &context.store;
    store.ensure::<RetrosDocument>().await?;

    match command {
        RetroCommand::New { title, date } => {
            let date = context.day_or_today(date.as_deref())?;
            let id = store
                .update(|d: &mut RetrosDocument| Ok(d.create(&join_words(&title), date)?.id))
                .await?;
            info!("Created retrospective {id}");
            println!("Created retrospective {id}");
        }
        RetroCommand::Add { id, category, text } => {
            let number = store
                .update(|d: &mut RetrosDocument| {
                    Ok(d.add_item(id, category, &join_words(&text))?)
                })
                .await?;
            println!("Added item {number} to `{category}`");
        }
        RetroCommand::Vote { id, number } => {
            let votes = store
                .update(|d: &mut RetrosDocument| Ok(d.vote(id, number)?))
                .await?;
            println!("Item {number} has {votes} votes");
        }
        RetroCommand::Drop { id, number } => {
            let item = store
                .update(|d: &mut RetrosDocument| Ok(d.remove_item(id, number)?))
                .await?;
            println!("Removed `{}`", item.text);
        }
        RetroCommand::List => {
            let document = store.load::<RetrosDocument>().await?;
            let retros = document.listing();
            if retros.is_empty() {
                println!("No retrospectives");
            }
            for retro in retros {
                println!(
                    "{}\t{}\t{}\t{} items",
                    retro.id,
                    retro.date,
                    retro.title,
                    retro.items.len()
                );
            }
        }
        RetroCommand::Show { id } => {
            let document = store.load::<RetrosDocument>().await?;
            let retro = document.get(id)?;
            println!("{} ({})", retro.title, retro.date);
            for section in retro.sections() {
                println!();
                println!("{}", section.category);
                if section.items.is_empty() {
                    println!("-");
                }
                for (number, item) in section.items {
                    println!("{number}\t+{}\t{}", item.votes, item.text);
                }
            }
        }
        RetroCommand::Remove { id } => {
            let retro = store
                .update(|d: &mut RetrosDocument| Ok(d.remove(id)?))
                .await?;
            println!("Removed retrospective {id}: {}", retro.title);
        }
    }
    Ok(())
}
