use std::{
    fmt::Display,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::debug;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScaffoldKind {
    Basic,
    Rust,
    Python,
    Node,
}

impl Display for ScaffoldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaffoldKind::Basic => write!(f, "basic"),
            ScaffoldKind::Rust => write!(f, "rust"),
            ScaffoldKind::Python => write!(f, "python"),
            ScaffoldKind::Node => write!(f, "node"),
        }
    }
}

const NAME: &str = "{{name}}";

/// Relative path and contents of every file. `{{name}}` is replaced in both.
type Template = &'static [(&'static str, &'static str)];

const README: &str = "# {{name}}\n";

const BASIC: Template = &[
    ("README.md", README),
    (".gitignore", "*.log\n*.tmp\n.env\n"),
    (
        "Makefile",
        ".PHONY: run\n\nrun:\n\t./bin/{{name}}\n",
    ),
    (
        "bin/{{name}}",
        "#!/usr/bin/env bash\nset -euo pipefail\n\necho \"Hello from {{name}}\"\n",
    ),
];

const RUST: Template = &[
    ("README.md", README),
    (".gitignore", "/target\n"),
    (
        "Cargo.toml",
        "[package]\nname = \"{{name}}\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[dependencies]\n",
    ),
    (
        "src/main.rs",
        "fn main() {\n    println!(\"Hello from {{name}}\");\n}\n",
    ),
];

const PYTHON: Template = &[
    ("README.md", README),
    (".gitignore", "__pycache__/\n*.pyc\n.venv/\ndist/\n"),
    (
        "pyproject.toml",
        "[project]\nname = \"{{name}}\"\nversion = \"0.1.0\"\nrequires-python = \">=3.9\"\n",
    ),
    (
        "main.py",
        "def main():\n    print(\"Hello from {{name}}\")\n\n\nif __name__ == \"__main__\":\n    main()\n",
    ),
];

const NODE: Template = &[
    ("README.md", README),
    (".gitignore", "node_modules/\ndist/\n"),
    (
        "package.json",
        "{\n  \"name\": \"{{name}}\",\n  \"version\": \"0.1.0\",\n  \"main\": \"index.js\",\n  \"scripts\": {\n    \"start\": \"node index.js\"\n  }\n}\n",
    ),
    ("index.js", "console.log(\"Hello from {{name}}\");\n"),
];

impl ScaffoldKind {
    fn template(&self) -> Template {
        match self {
            ScaffoldKind::Basic => BASIC,
            ScaffoldKind::Rust => RUST,
            ScaffoldKind::Python => PYTHON,
            ScaffoldKind::Node => NODE,
        }
    }
}

fn validate_name(name: &str) -> Result<&str, TrackerError> {
    let name = name.trim();
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(TrackerError::invalid(
            "project name",
            format!("`{name}` can't be used as a directory name"),
        ));
    }
    Ok(name)
}

/// Fails unless `target` is missing or an empty directory.
async fn check_target(target: &Path) -> Result<()> {
    let mut entries = match tokio::fs::read_dir(target).await {
        Ok(v) => v,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(_) if target.exists() => {
            return Err(TrackerError::Conflict(format!("{target:?} already exists")).into());
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to read {target:?}")),
    };
    if entries.next_entry().await?.is_some() {
        return Err(TrackerError::Conflict(format!("{target:?} is not empty")).into());
    }
    Ok(())
}

/// Creates `<parent>/<name>` from the template of `kind`. Returns created files relative to the
/// project directory.
pub async fn scaffold(kind: ScaffoldKind, name: &str, parent: &Path) -> Result<Vec<PathBuf>> {
    let name = validate_name(name)?;
    let target = parent.join(name);
    check_target(&target).await?;

    let mut created = vec![];
    for (path, contents) in kind.template() {
        let relative = PathBuf::from(path.replace(NAME, name));
        let path = target.join(&relative);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {dir:?}"))?;
        }
        tokio::fs::write(&path, contents.replace(NAME, name))
            .await
            .with_context(|| format!("Failed to write {path:?}"))?;
        debug!("Created {path:?}");
        created.push(relative);
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::error::TrackerError;

    use super::{scaffold, ScaffoldKind};

    #[tokio::test]
    async fn test_rust_project() -> Result<()> {
        let dir = tempdir()?;
        let created = scaffold(ScaffoldKind::Rust, "hello", dir.path()).await?;
        assert!(created.contains(&PathBuf::from("src/main.rs")));

        let manifest = tokio::fs::read_to_string(dir.path().join("hello/Cargo.toml")).await?;
        assert!(manifest.contains("name = \"hello\""));
        assert!(!manifest.contains("{{name}}"));
        Ok(())
    }

    #[tokio::test]
    async fn test_name_in_paths() -> Result<()> {
        let dir = tempdir()?;
        scaffold(ScaffoldKind::Basic, "tool", dir.path()).await?;
        let script = tokio::fs::read_to_string(dir.path().join("tool/bin/tool")).await?;
        assert!(script.contains("Hello from tool"));
        Ok(())
    }

    #[tokio::test]
    async fn test_every_kind_has_readme_and_gitignore() -> Result<()> {
        let dir = tempdir()?;
        for kind in [
            ScaffoldKind::Basic,
            ScaffoldKind::Rust,
            ScaffoldKind::Python,
            ScaffoldKind::Node,
        ] {
            let created = scaffold(kind, &kind.to_string(), dir.path()).await?;
            assert!(created.contains(&PathBuf::from("README.md")));
            assert!(created.contains(&PathBuf::from(".gitignore")));
            assert_eq!(created.len(), 4);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_target() -> Result<()> {
        let dir = tempdir()?;
        // empty directory is fine
        tokio::fs::create_dir(dir.path().join("empty")).await?;
        scaffold(ScaffoldKind::Node, "empty", dir.path()).await?;

        let error = scaffold(ScaffoldKind::Node, "empty", dir.path())
            .await
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TrackerError>(),
            Some(TrackerError::Conflict(_))
        ));

        tokio::fs::write(dir.path().join("file"), "").await?;
        assert!(scaffold(ScaffoldKind::Node, "file", dir.path())
            .await
            .is_err());
        assert!(scaffold(ScaffoldKind::Node, "../up", dir.path())
            .await
            .is_err());
        Ok(())
    }
}
