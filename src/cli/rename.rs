use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use regex::Regex;
use tracing::info;

use crate::{
    error::TrackerError,
    tools::rename::{apply, plan, RenameRules},
};

#[derive(Debug, Parser)]
pub struct RenameCommand {
    #[arg(help = "Directory whose files are renamed")]
    dir: PathBuf,
    #[arg(
        long,
        num_args = 2,
        value_names = ["REGEX", "WITH"],
        help = "Replace matches of a regular expression. `$1` refers to a capture group"
    )]
    replace: Option<Vec<String>>,
    #[arg(long, help = "Replace whitespace with underscores")]
    spaces: bool,
    #[arg(long, help = "Lowercase names and extensions")]
    lower: bool,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    suffix: Option<String>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "1",
        value_name = "START",
        help = "Put a zero padded sequence number in front of names, in name order"
    )]
    number: Option<usize>,
    #[arg(long, short = 'n', help = "Only print what would be renamed")]
    dry_run: bool,
}

impl RenameCommand {
    fn rules(&self) -> Result<RenameRules, TrackerError> {
        let replace = match self.replace.as_deref() {
            Some([pattern, with]) => Some((
                Regex::new(pattern)
                    .map_err(|e| TrackerError::invalid("regular expression", e.to_string()))?,
                with.clone(),
            )),
            Some(_) => {
                return Err(TrackerError::invalid(
                    "replace",
                    "expects a pattern and a replacement",
                ))
            }
            None => None,
        };
        Ok(RenameRules {
            replace,
            spaces: self.spaces,
            lower: self.lower,
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            number: self.number,
        })
    }
}

/// Command to process `rename`.
pub async fn process_rename_command(command: RenameCommand) -> Result<()> {
    let rules = command.rules()?;
    if rules.is_empty() {
        return Err(TrackerError::invalid("rename rules", "no rule was given").into());
    }

    let renames = plan(&command.dir, &rules).await?;
    if renames.is_empty() {
        println!("Nothing to rename");
        return Ok(());
    }
    for rename in &renames {
        println!("{}\t->\t{}", rename.from.display(), rename.to.display());
    }
    if command.dry_run {
        println!("Dry run, {} files would be renamed", renames.len());
        return Ok(());
    }
    apply(&renames).await?;
    info!("Renamed {} files in {:?}", renames.len(), command.dir);
    println!("Renamed {} files", renames.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::cli::testing::{context_at, noon, run};

    #[tokio::test]
    async fn test_dry_run_changes_nothing() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        let files = tempdir()?;
        std::fs::write(files.path().join("Holiday Photo.JPG"), "")?;
        let target = files.path().to_str().unwrap();

        run(&context, &["rename", target, "--spaces", "--lower", "--dry-run"]).await?;
        assert!(files.path().join("Holiday Photo.JPG").exists());

        run(&context, &["rename", target, "--spaces", "--lower"]).await?;
        assert!(files.path().join("holiday_photo.jpg").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_and_number() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        let files = tempdir()?;
        std::fs::write(files.path().join("IMG_001.png"), "")?;
        std::fs::write(files.path().join("IMG_002.png"), "")?;
        let target = files.path().to_str().unwrap();

        run(
            &context,
            &["rename", target, "--replace", "^IMG_[0-9]+$", "beach", "--number"],
        )
        .await?;
        assert!(files.path().join("01_beach.png").exists());
        assert!(files.path().join("02_beach.png").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_rules_are_required_and_validated() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        let target = dir.path().to_str().unwrap();
        assert!(run(&context, &["rename", target]).await.is_err());
        assert!(run(&context, &["rename", target, "--replace", "(", "x"])
            .await
            .is_err());
        Ok(())
    }
}
