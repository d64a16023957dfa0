//! Key-Value Backend
//!
//! Thin wrapper over the embedded sled store: two ordered trees keyed by
//! full path strings, plus the primitive steps the path store composes.
//! Each method here is one atomic step; composite operations built on top
//! of several steps are not atomic as a whole.

use crate::error::FsError;
use crate::meta::{FileInfo, FileMeta, META_LEN};
use std::path::Path;
use tracing::trace;

const TREE_FILES: &str = "files";
const TREE_DIRS: &str = "dirs";

/// Owned connection to the backing store and its two collections.
#[derive(Debug)]
pub(crate) struct Store {
    db: sled::Db,
    files: sled::Tree,
    dirs: sled::Tree,
}

impl Store {
    /// Open or create the backing store rooted at `path`, creating both
    /// collections idempotently.
    pub fn open(path: &Path) -> Result<Store, FsError> {
        let db = sled::open(path)?;
        let files = db.open_tree(TREE_FILES)?;
        let dirs = db.open_tree(TREE_DIRS)?;
        Ok(Store { db, files, dirs })
    }

    /// Persist the header followed by the payload under the file key,
    /// replacing any
    /// previous value.
    pub fn save_file(&self, name: &str, data: &[u8], meta: &FileMeta) -> Result<(), FsError> {
        let mut value = meta.encode()?;
        value.extend_from_slice(data);
        self.files.insert(name.as_bytes(), value)?;
        trace!(path = name, size = data.len(), "saved file entry");
        Ok(())
    }

    /// Load a file entry's payload and decoded header.
    pub fn load_file(&self, name: &str) -> Result<(Vec<u8>, FileMeta), FsError> {
        let value = self
            .files
            .get(name.as_bytes())?
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        let meta = FileMeta::decode(&value)?;
        Ok((value[META_LEN..].to_vec(), meta))
    }

    pub fn save_dir(&self, name: &str, meta: &FileMeta) -> Result<(), FsError> {
        self.dirs.insert(name.as_bytes(), meta.encode()?)?;
        trace!(path = name, "saved dir entry");
        Ok(())
    }

    pub fn load_dir(&self, name: &str) -> Result<FileMeta, FsError> {
        let value = self
            .dirs
            .get(name.as_bytes())?
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;
        FileMeta::decode(&value)
    }

    /// Delete one file key. Deleting an absent key succeeds.
    pub fn delete_file(&self, name: &str) -> Result<(), FsError> {
        self.files.remove(name.as_bytes())?;
        Ok(())
    }

    /// Delete one dir key. Deleting an absent key succeeds.
    pub fn delete_dir(&self, name: &str) -> Result<(), FsError> {
        self.dirs.remove(name.as_bytes())?;
        Ok(())
    }

    /// Delete every file key sharing `prefix` as a byte-level prefix, in one
    /// atomic batch. The match is not segment-aware: prefix "ab" also covers
    /// a sibling "abc.txt".
    pub fn delete_file_prefix(&self, prefix: &str) -> Result<(), FsError> {
        let mut batch = sled::Batch::default();
        let mut matched = 0usize;
        for entry in self.files.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            batch.remove(key);
            matched += 1;
        }
        self.files.apply_batch(batch)?;
        trace!(prefix, matched, "deleted file entries by prefix");
        Ok(())
    }

    /// List the direct children of `dir` by scanning file keys in order.
    ///
    /// The listing is derived, never stored: a child is any file key with
    /// `dir + "/"` as a prefix (empty prefix for the root) whose remainder
    /// holds no further separator. A `count` of zero means unbounded.
    pub fn read_dir(&self, dir: &str, count: usize) -> Result<Vec<FileInfo>, FsError> {
        let mut prefix = dir.to_string();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        let mut infos = Vec::new();
        for entry in self.files.scan_prefix(prefix.as_bytes()) {
            let (key, value) = entry?;
            let Ok(key) = std::str::from_utf8(&key) else {
                continue;
            };
            let rest = &key[prefix.len()..];
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            let meta = FileMeta::decode(&value)?;
            infos.push(FileInfo::from_meta(rest, &meta));
            if count > 0 && infos.len() >= count {
                break;
            }
        }
        Ok(infos)
    }

    /// Flush outstanding writes to the backing store.
    pub fn flush(&self) -> Result<(), FsError> {
        self.db.flush()?;
        Ok(())
    }
}
