//! Directory Handle
//!
//! Read-only view over a directory path. Nothing is buffered: every
//! listing defers to the path store's prefix scan, and all content
//! operations are rejected.

use crate::error::FsError;
use crate::file::File;
use crate::fs::base_name;
use crate::meta::{FileInfo, FileMeta};
use crate::store::Store;
use std::io::SeekFrom;
use std::sync::Arc;

/// Open handle on a directory entity.
#[derive(Debug)]
pub struct SledDir {
    store: Arc<Store>,
    name: String,
    meta: FileMeta,
}

impl SledDir {
    pub(crate) fn new(store: Arc<Store>, name: &str, meta: FileMeta) -> SledDir {
        SledDir {
            store,
            name: name.to_string(),
            meta,
        }
    }

    fn invalid(&self, op: &str) -> FsError {
        FsError::InvalidOperation(format!("{op} on directory {}", self.name))
    }
}

impl File for SledDir {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, _buf: &mut [u8]) -> Result<usize, FsError> {
        Err(self.invalid("read"))
    }

    fn read_at(&self, _buf: &mut [u8], _offset: u64) -> Result<usize, FsError> {
        Err(self.invalid("read_at"))
    }

    fn seek(&self, _pos: SeekFrom) -> Result<u64, FsError> {
        Err(self.invalid("seek"))
    }

    fn write(&self, _buf: &[u8]) -> Result<usize, FsError> {
        Err(self.invalid("write"))
    }

    fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize, FsError> {
        Err(self.invalid("write_at"))
    }

    fn truncate(&self, _size: u64) -> Result<(), FsError> {
        Err(self.invalid("truncate"))
    }

    fn close(&self) -> Result<(), FsError> {
        Ok(())
    }

    fn stat(&self) -> Result<FileInfo, FsError> {
        Ok(FileInfo {
            name: base_name(&self.name).to_string(),
            size: 0,
            mode: self.meta.mode,
            mod_time: self.meta.modified(),
            is_dir: true,
        })
    }

    fn read_dir(&self, count: usize) -> Result<Vec<FileInfo>, FsError> {
        self.store.read_dir(&self.name, count)
    }
}
