use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use fs4::tokio::AsyncFileExt;
use tokio::fs::File;
use tracing::trace;

use crate::error::StoreError;

/// Advisory lock guarding a data file. The lock lives on a separate `<file>.lock` so that it
/// survives the data file being replaced by a rename.
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    pub async fn exclusive(data_path: &Path) -> Result<Self, StoreError> {
        let lock = Self::open(data_path).await?;
        lock.file
            .lock_exclusive()
            .map_err(|e| StoreError::io(&lock.path, e))?;
        trace!("Acquired exclusive lock {:?}", lock.path);
        Ok(lock)
    }

    pub async fn shared(data_path: &Path) -> Result<Self, StoreError> {
        let lock = Self::open(data_path).await?;
        lock.file
            .lock_shared()
            .map_err(|e| StoreError::io(&lock.path, e))?;
        trace!("Acquired shared lock {:?}", lock.path);
        Ok(lock)
    }

    /// Releases the lock. Dropping the guard releases it as well once the file is closed.
    pub async fn release(self) -> Result<(), StoreError> {
        self.file
            .unlock_async()
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }

    async fn open(data_path: &Path) -> Result<Self, StoreError> {
        let path = sibling_path(data_path, "lock");
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(Self { file, path })
    }
}

/// `data/tasks.json` -> `data/tasks.json.<extension>`
pub fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{sibling_path, FileLock};

    #[test]
    fn test_sibling_path() {
        assert_eq!(
            sibling_path(Path::new("data/tasks.json"), "lock"),
            Path::new("data/tasks.json.lock")
        );
    }

    #[tokio::test]
    async fn test_lock_can_be_reacquired_after_release() -> Result<()> {
        let dir = tempdir()?;
        let data = dir.path().join("habits.json");

        let lock = FileLock::exclusive(&data).await?;
        lock.release().await?;
        let lock = FileLock::shared(&data).await?;
        lock.release().await?;

        assert!(dir.path().join("habits.json.lock").exists());
        assert!(!data.exists());
        Ok(())
    }
}
