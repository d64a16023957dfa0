//! Sledfs: Hierarchical Filesystem over an Ordered Key-Value Store
//!
//! Maps full path strings onto two ordered sled trees. File entries carry a
//! fixed-width metadata header in front of their payload; directory entries
//! are metadata-only records. Hierarchy is emulated with lexicographic
//! prefix scans, so directory listings are derived on demand rather than
//! stored.

pub mod dir;
pub mod error;
pub mod file;
pub mod fs;
pub mod meta;
mod store;

pub use dir::SledDir;
pub use error::FsError;
pub use file::{File, SledFile};
pub use fs::{Fs, OpenFlags, SledFs};
pub use meta::{FileInfo, FileMeta, FileMode, META_LEN, MODE_DIR};
