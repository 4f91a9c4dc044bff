use std::path::PathBuf;

use thiserror::Error;

/// Failures caused by the user's request rather than the environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TrackerError {
    #[error("{kind} `{key}` was not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} `{key}` already exists")]
    Duplicate { kind: &'static str, key: String },

    #[error("Invalid {what}: {reason}")]
    Invalid { what: &'static str, reason: String },

    #[error("{0}")]
    Conflict(String),
}

impl TrackerError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn duplicate(kind: &'static str, key: impl ToString) -> Self {
        Self::Duplicate {
            kind,
            key: key.to_string(),
        }
    }

    pub fn invalid(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            what,
            reason: reason.into(),
        }
    }
}

/// Failures of the data files themselves.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Data file `{}` is corrupted: {}", .path.display(), .source)]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error with data file `{}`: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
