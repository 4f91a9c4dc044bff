use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::tools::scaffold::{scaffold, ScaffoldKind};

#[derive(Debug, Parser)]
pub struct ScaffoldCommand {
    kind: ScaffoldKind,
    name: String,
    #[arg(long, short, default_value = ".", help = "Directory the project is created in")]
    path: PathBuf,
}

/// Command to process `scaffold`.
pub async fn process_scaffold_command(command: ScaffoldCommand) -> Result<()> {
    let created = scaffold(command.kind, &command.name, &command.path).await?;
    let root = command.path.join(command.name.trim());
    info!("Scaffolded {} project in {root:?}", command.kind);
    println!("Created {} project in {}", command.kind, root.display());
    for file in created {
        println!("{}", file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::cli::testing::{context_at, noon, run};

    #[tokio::test]
    async fn test_scaffold_python() -> Result<()> {
        let dir = tempdir()?;
        let context = context_at(dir.path(), noon())?;
        let parent = dir.path().to_str().unwrap();
        run(&context, &["scaffold", "python", "tool", "--path", parent]).await?;

        let manifest = std::fs::read_to_string(dir.path().join("tool/pyproject.toml"))?;
        assert!(manifest.contains("name = \"tool\""));
        assert!(run(&context, &["scaffold", "python", "tool", "-p", parent])
            .await
            .is_err());
        assert!(run(&context, &["scaffold", "cobol", "tool", "-p", parent])
            .await
            .is_err());
        Ok(())
    }
}
