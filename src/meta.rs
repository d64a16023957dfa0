//! Metadata Codec
//!
//! Fixed-width binary encoding of the metadata record stored in front of
//! every file payload and directory entry.

use crate::error::FsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Encoded length of a [`FileMeta`] record: mode (4) + size (8) +
/// mod_time (8) + is_dir (1). Every value read from the files collection is
/// the header followed by the payload, so the payload always starts at
/// this offset.
pub const META_LEN: usize = 4 + 8 + 8 + 1;

/// Directory type bit within a [`FileMode`] word.
pub const MODE_DIR: u32 = 1 << 31;

/// Default mode for files created through `create`.
pub const DEFAULT_FILE_MODE: FileMode = FileMode(0o666);

/// Permission and type bits for a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileMode(pub u32);

impl FileMode {
    /// True when the directory type bit is set.
    pub fn is_dir(self) -> bool {
        self.0 & MODE_DIR != 0
    }

    /// Permission bits only (lowest nine bits).
    pub fn perm(self) -> u32 {
        self.0 & 0o777
    }

    pub(crate) fn with_dir_bit(self) -> FileMode {
        FileMode(self.0 | MODE_DIR)
    }
}

/// Metadata record prefixed onto every stored value.
///
/// Encoded with bincode's legacy config (little-endian, fixed-width
/// integers, one-byte bool), which yields the exact [`META_LEN`]-byte
/// positional layout. There is no version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub mode: FileMode,
    /// Payload length in bytes; zero for directories.
    pub size: u64,
    /// Last modification, nanoseconds since the Unix epoch.
    pub mod_time: i64,
    /// Redundant with the mode bit, kept for decode simplicity.
    pub is_dir: bool,
}

impl FileMeta {
    pub fn encode(&self) -> Result<Vec<u8>, FsError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a header from the front of a stored value. Trailing payload
    /// bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<FileMeta, FsError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Modification instant as a UTC datetime.
    pub fn modified(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.mod_time)
    }
}

/// Stat and listing view of a file or directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Final path segment.
    pub name: String,
    pub size: u64,
    pub mode: FileMode,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
}

impl FileInfo {
    pub(crate) fn from_meta(name: &str, meta: &FileMeta) -> FileInfo {
        FileInfo {
            name: name.to_string(),
            size: meta.size,
            mode: meta.mode,
            mod_time: meta.modified(),
            is_dir: meta.is_dir,
        }
    }
}

/// Current instant as epoch nanoseconds. Saturates past the year 2262.
pub(crate) fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

pub(crate) fn datetime_nanos(t: DateTime<Utc>) -> i64 {
    t.timestamp_nanos_opt().unwrap_or(i64::MAX)
}
