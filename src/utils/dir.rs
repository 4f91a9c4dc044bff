use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "daybook";

/// Default application directory. `$XDG_STATE_HOME/daybook` or `$HOME/.local/state/daybook` on
/// unix, `%APPDATA%\daybook` on Windows.
pub fn default_application_path() -> Result<PathBuf> {
    let mut path = platform_state_dir()?;
    path.push(APPLICATION_DIR);
    Ok(path)
}

fn platform_state_dir() -> Result<PathBuf> {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))
        } else {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| {
                        let mut path = PathBuf::from(home);
                        path.push(".local/state");
                        path
                    })
                })
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))
        }
    }
}

/// Creates the directory if it's missing and returns it back.
pub fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::ensure_dir;

    #[test]
    fn test_ensure_dir_nested() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("a").join("b");
        let created = ensure_dir(nested.clone())?;
        assert_eq!(created, nested);
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_dir(nested.clone())?;
        Ok(())
    }
}
