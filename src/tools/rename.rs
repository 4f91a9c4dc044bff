use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::error::TrackerError;

/// Transformations applied to file stems, in field order.
#[derive(Debug, Default)]
pub struct RenameRules {
    pub replace: Option<(Regex, String)>,
    pub spaces: bool,
    pub lower: bool,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// First number of a zero-padded sequence put in front of every name.
    pub number: Option<usize>,
}

impl RenameRules {
    pub fn is_empty(&self) -> bool {
        self.replace.is_none()
            && !self.spaces
            && !self.lower
            && self.prefix.is_none()
            && self.suffix.is_none()
            && self.number.is_none()
    }

    fn apply(&self, file_name: &str, sequence: Option<(usize, usize)>) -> String {
        let (stem, extension) = match file_name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
            _ => (file_name, None),
        };

        let mut stem = stem.to_string();
        if let Some((pattern, with)) = &self.replace {
            stem = pattern.replace_all(&stem, with.as_str()).into_owned();
        }
        if self.spaces {
            stem = stem.split_whitespace().collect::<Vec<_>>().join("_");
        }
        let mut extension = extension.map(str::to_string);
        if self.lower {
            stem = stem.to_lowercase();
            extension = extension.map(|v| v.to_lowercase());
        }
        if let Some((number, width)) = sequence {
            stem = format!("{number:0width$}_{stem}");
        }
        if let Some(prefix) = &self.prefix {
            stem = format!("{prefix}{stem}");
        }
        if let Some(suffix) = &self.suffix {
            stem.push_str(suffix);
        }

        match extension {
            Some(extension) => format!("{stem}.{extension}"),
            None => stem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Visible regular files of `dir`, sorted by name.
async fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read directory {dir:?}"))?;
    let mut files = vec![];
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        files.push(name);
    }
    files.sort();
    Ok(files)
}

/// Works out every rename without touching the disk. Unchanged names are left out.
pub async fn plan(dir: &Path, rules: &RenameRules) -> Result<Vec<Rename>> {
    let files = list_files(dir).await?;
    let width = rules
        .number
        .map(|start| (start + files.len().saturating_sub(1)).to_string().len().max(2))
        .unwrap_or_default();

    let mut renames = vec![];
    for (index, name) in files.iter().enumerate() {
        let sequence = rules.number.map(|start| (start + index, width));
        let target = rules.apply(name, sequence);
        if target.is_empty() || target.contains(['/', '\\']) {
            return Err(TrackerError::invalid(
                "rename rules",
                format!("`{name}` would be renamed to `{target}`"),
            )
            .into());
        }
        if &target != name {
            renames.push((name.clone(), target));
        }
    }

    check_conflicts(dir, &files, &renames).await?;
    Ok(renames
        .into_iter()
        .map(|(from, to)| Rename {
            from: dir.join(from),
            to: dir.join(to),
        })
        .collect())
}

async fn check_conflicts(dir: &Path, files: &[String], renames: &[(String, String)]) -> Result<()> {
    let mut targets = HashMap::new();
    for (from, to) in renames {
        if let Some(other) = targets.insert(to.as_str(), from.as_str()) {
            return Err(TrackerError::Conflict(format!(
                "`{other}` and `{from}` would both be renamed to `{to}`"
            ))
            .into());
        }
    }

    let moving = renames
        .iter()
        .map(|(from, _)| from.as_str())
        .collect::<HashSet<_>>();
    for (from, to) in renames {
        let taken_by_unchanged = files.iter().any(|v| v == to) && !moving.contains(to.as_str());
        let taken_outside = !files.iter().any(|v| v == to)
            && tokio::fs::try_exists(dir.join(to)).await?;
        if taken_by_unchanged || taken_outside {
            return Err(TrackerError::Conflict(format!(
                "Can't rename `{from}`, `{to}` already exists"
            ))
            .into());
        }
    }
    Ok(())
}

/// Performs the renames. When a target is also the source of another rename every file is first
/// moved to a temporary name.
pub async fn apply(renames: &[Rename]) -> Result<()> {
    let sources = renames.iter().map(|v| &v.from).collect::<HashSet<_>>();
    let chained = renames.iter().any(|v| sources.contains(&v.to));

    if !chained {
        for rename in renames {
            tokio::fs::rename(&rename.from, &rename.to)
                .await
                .with_context(|| format!("Failed to rename {:?}", rename.from))?;
            info!("Renamed {:?} to {:?}", rename.from, rename.to);
        }
        return Ok(());
    }

    let mut staged = vec![];
    for (index, rename) in renames.iter().enumerate() {
        let mut temporary = rename.from.clone();
        temporary.set_file_name(format!(".daybook-rename-{index}"));
        tokio::fs::rename(&rename.from, &temporary)
            .await
            .with_context(|| format!("Failed to rename {:?}", rename.from))?;
        debug!("Staged {:?} as {temporary:?}", rename.from);
        staged.push((temporary, rename));
    }
    for (temporary, rename) in staged {
        tokio::fs::rename(&temporary, &rename.to)
            .await
            .with_context(|| format!("Failed to rename {:?}", rename.from))?;
        info!("Renamed {:?} to {:?}", rename.from, rename.to);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;
    use regex::Regex;
    use tempfile::tempdir;

    use crate::error::TrackerError;

    use super::{apply, plan, RenameRules};

    async fn touch(dir: &Path, names: &[&str]) -> Result<()> {
        for name in names {
            tokio::fs::write(dir.join(name), name.as_bytes()).await?;
        }
        Ok(())
    }

    async fn names(dir: &Path) -> Result<Vec<String>> {
        let mut names = vec![];
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    #[test]
    fn test_rules() {
        let rules = RenameRules {
            replace: Some((Regex::new("IMG").unwrap(), "photo".into())),
            spaces: true,
            lower: true,
            prefix: Some("trip-".into()),
            suffix: Some("-raw".into()),
            number: None,
        };
        assert_eq!(rules.apply("IMG Beach Day.JPG", None), "trip-photo_beach_day-raw.jpg");
        assert_eq!(
            RenameRules::default().apply("Makefile", Some((7, 3))),
            "007_Makefile"
        );
    }

    #[tokio::test]
    async fn test_plan_skips_hidden_dirs_and_unchanged() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["My File.txt", ".hidden file", "plain.txt"]).await?;
        tokio::fs::create_dir(dir.path().join("sub dir")).await?;

        let rules = RenameRules {
            spaces: true,
            ..Default::default()
        };
        let renames = plan(dir.path(), &rules).await?;
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].to, dir.path().join("My_File.txt"));

        // planning doesn't touch the disk
        assert!(dir.path().join("My File.txt").exists());
        apply(&renames).await?;
        assert_eq!(
            names(dir.path()).await?,
            vec![".hidden file", "My_File.txt", "plain.txt", "sub dir"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_numbering_in_sorted_order() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["b.png", "a.png", "c.png"]).await?;
        let rules = RenameRules {
            number: Some(9),
            ..Default::default()
        };
        apply(&plan(dir.path(), &rules).await?).await?;
        assert_eq!(
            names(dir.path()).await?,
            vec!["09_a.png", "10_b.png", "11_c.png"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_conflicts() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["A.txt", "a.txt"]).await?;
        let rules = RenameRules {
            lower: true,
            ..Default::default()
        };
        let error = plan(dir.path(), &rules).await.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TrackerError>(),
            Some(TrackerError::Conflict(_))
        ));

        let dir = tempdir()?;
        touch(dir.path(), &["x 1.txt", "x_1.txt"]).await?;
        let rules = RenameRules {
            spaces: true,
            ..Default::default()
        };
        assert!(plan(dir.path(), &rules).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_chained_renames() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["ab.txt", "b.txt"]).await?;
        let rules = RenameRules {
            prefix: Some("a".into()),
            ..Default::default()
        };
        apply(&plan(dir.path(), &rules).await?).await?;
        assert_eq!(names(dir.path()).await?, vec!["aab.txt", "ab.txt"]);
        assert_eq!(tokio::fs::read_to_string(dir.path().join("ab.txt")).await?, "b.txt");
        assert_eq!(tokio::fs::read_to_string(dir.path().join("aab.txt")).await?, "ab.txt");
        Ok(())
    }
}
