use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationStoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse conversation JSON at {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize conversation for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot locate the home directory")]
    HomeDirUnavailable,

    #[error("conversation id '{id}' is not a valid file stem")]
    InvalidId { id: String },

    #[error("no conversation with id '{id}' under {root}")]
    NotFound { id: String, root: PathBuf },

    #[error("no conversations found under {root}")]
    NoConversations { root: PathBuf },

    #[error("conversation {path} has invalid RFC3339 timestamp: {value}")]
    InvalidTimestamp { path: PathBuf, value: String },

    #[error("failed to format the current time: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl ConversationStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonParse {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }
}
