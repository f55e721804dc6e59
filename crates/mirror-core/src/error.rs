//! Error types for mirror-core

use std::fmt;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of the mirror an enumeration ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Local,
    Remote,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Change events were requested before any snapshot was captured
    #[error("Local snapshot has not been captured yet")]
    SnapshotNotCaptured,

    /// The after hook ran without a successful before hook in the same cycle
    #[error("No prepared cycle: the before-unit-of-work phase did not complete")]
    CycleNotPrepared,

    /// Listing the names at one of the roots failed
    #[error("Failed to enumerate {side} names at {root}: {source}")]
    Enumeration {
        side: Side,
        root: String,
        #[source]
        source: Box<Error>,
    },

    /// A name that cannot address a single file directly under a root
    #[error("Invalid file name {name:?}: {reason}")]
    InvalidFileName { name: String, reason: &'static str },

    /// Settings are incomplete or contradictory
    #[error("Invalid settings: {message}")]
    Settings { message: String },

    /// Backend selector did not match any known backend
    #[error("Unknown storage backend: {value}")]
    UnknownBackend { value: String },

    /// Object key not present in the bucket
    #[error("Object {key} not found in bucket {bucket}")]
    ObjectNotFound { bucket: String, key: String },

    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn enumeration(side: Side, root: impl fmt::Display, source: impl Into<Error>) -> Self {
        Self::Enumeration {
            side,
            root: root.to_string(),
            source: Box::new(source.into()),
        }
    }

    pub(crate) fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }
}
