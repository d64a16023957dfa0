//! Error types for the filesystem surface and its handles.

use thiserror::Error;

/// Errors surfaced by [`Fs`](crate::Fs) operations and file handles.
#[derive(Debug, Error)]
pub enum FsError {
    /// A read-class lookup missed both the files and dirs collections.
    #[error("file does not exist: {0}")]
    NotFound(String),

    /// Reserved for exclusivity checks. `create` and `mkdir` currently
    /// overwrite unconditionally, so no operation produces this kind.
    #[error("file already exists: {0}")]
    AlreadyExists(String),

    /// Operation attempted on a handle after `close`.
    #[error("file already closed: {0}")]
    Closed(String),

    /// Malformed caller input, such as a negative seek position.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Content operation attempted on a directory handle.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Backend transaction failure, passed through verbatim.
    #[error("storage backend: {0}")]
    Backend(#[from] sled::Error),

    /// Metadata header (de)serialization failure.
    #[error("metadata codec: {0}")]
    Codec(#[from] bincode::Error),
}

impl FsError {
    /// True when the error indicates a missing path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}
