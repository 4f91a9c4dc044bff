use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::{error::StoreError, fs::operations::read_last_line};

use super::{
    document_store::write_atomically,
    lock::{sibling_path, FileLock},
};

/// A record kept in a [RecordLog]. Ids are assigned by the log on append.
pub trait LogRecord: Serialize + DeserializeOwned {
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

/// Append-only file with one JSON record per line. New records never rewrite the file, only
/// removals do. The highest id ever handed out is kept in a `<log>.seq` sidecar so removing the
/// newest record doesn't free its id.
pub struct RecordLog<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: LogRecord> RecordLog<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _record: PhantomData,
        }
    }

    /// Appends a record, giving it the id after the highest one the log has ever assigned.
    pub async fn append(&self, record: T) -> Result<T> {
        let lock = FileLock::exclusive(&self.path).await?;
        let result = self.append_locked(record).await;
        lock.release().await?;
        result
    }

    pub async fn read_all(&self) -> Result<Vec<T>> {
        let lock = FileLock::shared(&self.path).await?;
        let result = read_records(&self.path).await;
        lock.release().await?;
        result
    }

    /// Removes the record with `id`, returning it if it was present.
    pub async fn remove(&self, id: u64) -> Result<Option<T>> {
        let lock = FileLock::exclusive(&self.path).await?;
        let result = self.remove_locked(id).await;
        lock.release().await?;
        result
    }

    async fn append_locked(&self, mut record: T) -> Result<T> {
        let mut file = File::options()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        let id = self.last_id(&mut file).await?.max(self.read_sequence().await?) + 1;
        record.set_id(id);

        let mut buffer = Vec::<u8>::new();
        // A write cut short by a crash leaves the last line unterminated.
        if !ends_with_newline(&mut file).await? {
            buffer.push(b'\n');
        }
        serde_json::to_writer(&mut buffer, &record)?;
        buffer.push(b'\n');

        file.write_all(&buffer).await?;
        file.flush().await?;
        self.write_sequence(id).await?;
        debug!("Appended record {id} to {:?}", self.path);
        Ok(record)
    }

    async fn read_sequence(&self) -> Result<u64> {
        let path = sibling_path(&self.path, "seq");
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text.trim().parse().unwrap_or_else(|e| {
                warn!("Sequence in {path:?} was corrupted {e}");
                0
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(StoreError::io(&path, e).into()),
        }
    }

    async fn write_sequence(&self, id: u64) -> Result<()> {
        write_atomically(&sibling_path(&self.path, "seq"), format!("{id}\n").as_bytes()).await
    }

    async fn last_id(&self, file: &mut File) -> Result<u64> {
        let Some(last_line) = read_last_line(file).await? else {
            return Ok(0);
        };
        match serde_json::from_str::<T>(&last_line) {
            Ok(v) => Ok(v.id()),
            Err(e) => {
                // Might happen after a shutdown cut off a write. Fall back to the whole log.
                warn!("Last record in {:?} was corrupted {e}", self.path);
                let records = read_records::<T>(&self.path).await?;
                Ok(records.iter().map(LogRecord::id).max().unwrap_or(0))
            }
        }
    }

    async fn remove_locked(&self, id: u64) -> Result<Option<T>> {
        let records = read_records::<T>(&self.path).await?;
        let Some(position) = records.iter().position(|v| v.id() == id) else {
            return Ok(None);
        };

        // Logs written before the sidecar existed only know their ids from the records.
        let highest = records.iter().map(LogRecord::id).max().unwrap_or(0);
        self.write_sequence(highest.max(self.read_sequence().await?)).await?;

        let mut kept = records;
        let removed = kept.remove(position);

        let mut buffer = Vec::<u8>::new();
        for record in &kept {
            serde_json::to_writer(&mut buffer, record)?;
            buffer.push(b'\n');
        }
        write_atomically(&self.path, &buffer).await?;
        Ok(Some(removed))
    }
}

async fn ends_with_newline(file: &mut File) -> Result<bool> {
    let length = file.seek(std::io::SeekFrom::End(0)).await?;
    if length == 0 {
        return Ok(true);
    }
    file.seek(std::io::SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

async fn read_records<T: LogRecord>(path: &Path) -> Result<Vec<T>> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(StoreError::io(path, e).into()),
    };
    let mut lines = BufReader::new(file).lines();
    let mut records = vec![];
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(v) => records.push(v),
            Err(e) => {
                // ignore illegal values. Might happen after shutdowns
                warn!(
                    "During parsing in path {:?} found illegal json string {}:  {e}",
                    path, &line
                )
            }
        }
    }
    Ok(records)
}
