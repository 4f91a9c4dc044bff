use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    storage::document_store::DocumentStore,
    tracker::bookmarks::{Bookmark, BookmarksDocument},
};

use super::{join_words, Context};

#[derive(Debug, Subcommand)]
pub enum BookmarksCommand {
    #[command(about = "Save an address. Title defaults to the host")]
    Add {
        url: String,
        title: Vec<String>,
        #[arg(long = "tag", short, help = "Tag of the bookmark, can be repeated")]
        tags: Vec<String>,
    },
    #[command(about = "List bookmarks", visible_alias = "ls")]
    List {
        #[arg(long, short, help = "Only bookmarks with this tag")]
        tag: Option<String>,
    },
    #[command(about = "Search titles, addresses and tags")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    #[command(about = "Remove a bookmark", visible_aliases = ["rm", "delete"])]
    Remove { id: u64 },
    #[command(about = "Add tags to a bookmark")]
    Tag {
        id: u64,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    #[command(about = "Remove tags from a bookmark")]
    Untag {
        id: u64,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    #[command(about = "Tags with their usage counts")]
    Tags,
    #[command(about = "Change the title of a bookmark")]
    Rename {
        id: u64,
        #[arg(required = true)]
        title: Vec<String>,
    },
}

fn print_bookmark(bookmark: &Bookmark) {
    let tags = bookmark
        .tags
        .iter()
        .map(|v| format!("#{v}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "{}\t{}\t{}\t{tags}",
        bookmark.id, bookmark.title, bookmark.url
    );
}

/// Command to process `bookmarks` commands.
pub async fn process_bookmarks_command(
    command: BookmarksCommand,
    context: &Context,
) -> Result<()> {
    let store = &context.store;
    store.ensure::<BookmarksDocument>().await?;

    match command {
        BookmarksCommand::Add { url, title, tags } => {
            let title = (!title.is_empty()).then(|| join_words(&title));
            let now = context.now_utc();
            let bookmark = store
                .update(|d: &mut BookmarksDocument| {
                    Ok(d.add(&url, title.as_deref(), &tags, now)?.clone())
                })
                .await?;
            info!("Added bookmark {}", bookmark.id);
            println!("Added bookmark {}: {}", bookmark.id, bookmark.url);
        }
        BookmarksCommand::List { tag } => {
            let document = store.load::<BookmarksDocument>().await?;
            let bookmarks = document.with_tag(tag.as_deref());
            if bookmarks.is_empty() {
                println!("No bookmarks");
            }
            for bookmark in bookmarks {
                print_bookmark(bookmark);
            }
        }
        BookmarksCommand::Search { query } => {
            let document = store.load::<BookmarksDocument>().await?;
            for bookmark in document.search(&join_words(&query)) {
                print_bookmark(bookmark);
            }
        }
        BookmarksCommand::Remove { id } => {
            let bookmark = store
                .update(|d: &mut BookmarksDocument| Ok(d.remove(id)?))
                .await?;
            println!("Removed bookmark {id}: {}", bookmark.url);
        }
        BookmarksCommand::Tag { id, tags } => {
            let bookmark = store
                .update(|d: &mut BookmarksDocument| Ok(d.tag(id, &tags)?.clone()))
                .await?;
            print_bookmark(&bookmark);
        }
        BookmarksCommand::Untag { id, tags } => {
            let bookmark = store
                .update(|d: &mut BookmarksDocument| Ok(d.untag(id, &tags)?.clone()))
                .await?;
            print_bookmark(&bookmark);
        }
        BookmarksCommand::Tags => {
            let document = store.load::<BookmarksDocument>().await?;
            for (tag, count) in document.tag_counts() {
                println!("{tag}\t{count}");
            }
        }
        BookmarksCommand::Rename { id, title } => {
            store
                .update(|d: &mut BookmarksDocument| Ok(d.retitle(id, &join_words(&title))?))
                .await?;
            println!("Renamed bookmark {id}");
        }
    }
    Ok(())
}
