use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::debug;

use crate::error::StoreError;

use super::{
    lock::{sibling_path, FileLock},
    record_log::{LogRecord, RecordLog},
};

/// A JSON document owned by one tool. A missing file reads as [Default::default].
pub trait Document: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
}

/// Interface for abstracting storage of documents.
pub trait DocumentStore {
    /// Writes the default document if there is none yet.
    fn ensure<D: Document>(&self) -> impl Future<Output = Result<()>>;

    /// Reads a document under a shared lock.
    fn load<D: Document>(&self) -> impl Future<Output = Result<D>>;

    /// Read-modify-write under an exclusive lock. The document is only written back when `f`
    /// succeeds.
    fn update<D, R, F>(&self, f: F) -> impl Future<Output = Result<R>>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<R>;
}

/// The main realization of [DocumentStore]. Keeps every document in a single directory.
pub struct JsonDocumentStore {
    data_dir: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(data_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&data_dir)?;

        Ok(Self { data_dir })
    }

    pub fn record_log<T: LogRecord>(&self, file_name: &str) -> RecordLog<T> {
        RecordLog::new(self.data_dir.join(file_name))
    }

    fn path_of<D: Document>(&self) -> PathBuf {
        self.data_dir.join(D::FILE_NAME)
    }

    async fn update_locked<D, R, F>(path: &Path, f: F) -> Result<R>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<R>,
    {
        let mut document = read_document::<D>(path).await?;
        let value = f(&mut document)?;
        write_atomically(path, &to_json(&document)?).await?;
        debug!("Updated {path:?}");
        Ok(value)
    }
}

impl DocumentStore for JsonDocumentStore {
    async fn ensure<D: Document>(&self) -> Result<()> {
        let path = self.path_of::<D>();
        let lock = FileLock::exclusive(&path).await?;
        let result = match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!("Seeding {path:?}");
                write_atomically(&path, &to_json(&D::default())?).await
            }
            Err(e) => Err(StoreError::io(&path, e).into()),
        };
        lock.release().await?;
        result
    }

    async fn load<D: Document>(&self) -> Result<D> {
        let path = self.path_of::<D>();
        let lock = FileLock::shared(&path).await?;
        let result = read_document(&path).await;
        lock.release().await?;
        result
    }

    async fn update<D, R, F>(&self, f: F) -> Result<R>
    where
        D: Document,
        F: FnOnce(&mut D) -> Result<R>,
    {
        let path = self.path_of::<D>();
        let lock = FileLock::exclusive(&path).await?;
        let result = Self::update_locked(&path, f).await;
        lock.release().await?;
        result
    }
}

async fn read_document<D: Document>(path: &Path) -> Result<D> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(D::default()),
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
            StoreError::Corrupt {
                path: path.to_owned(),
                source,
            }
            .into()
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(D::default()),
        Err(e) => Err(StoreError::io(path, e).into()),
    }
}

fn to_json<D: Serialize>(document: &D) -> Result<Vec<u8>> {
    let mut buffer = serde_json::to_vec_pretty(document)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Writes into `<path>.tmp` and renames it over `path`. Callers must hold the exclusive lock, the
/// temporary name is shared.
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = sibling_path(path, "tmp");
    let write = async {
        let mut file = File::create(&tmp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, path).await
    };
    write.await.map_err(|e| StoreError::io(path, e).into())
}
