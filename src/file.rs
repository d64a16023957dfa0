//! File Handle
//!
//! Buffered, mutex-guarded random access to one file entity. The handle
//! owns a private copy of the payload; every mutating call persists the
//! whole buffer back to the store before returning, so in-memory and
//! stored state only diverge when that persistence step fails.

use crate::error::FsError;
use crate::fs::base_name;
use crate::meta::{now_nanos, FileInfo, FileMeta};
use crate::store::Store;
use parking_lot::{Mutex, MutexGuard};
use std::io::SeekFrom;
use std::sync::Arc;

/// Handle surface shared by open files and directories.
pub trait File: Send + Sync + std::fmt::Debug {
    /// Full path this handle was opened with.
    fn name(&self) -> &str;

    /// Sequential read from the handle's cursor. Returns the number of
    /// bytes copied, zero at end of data.
    fn read(&self, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Positional read from the in-memory snapshot; the cursor is left
    /// untouched. Returns zero when `offset` is at or past the end.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, FsError>;

    /// Reposition the cursor. Seeking past the end is legal and does not
    /// resize the buffer; a negative resulting position is rejected.
    fn seek(&self, pos: SeekFrom) -> Result<u64, FsError>;

    /// Append `buf` to the payload and synchronously persist it.
    fn write(&self, buf: &[u8]) -> Result<usize, FsError>;

    /// Overwrite or extend the payload at `offset`, zero-filling any gap
    /// before it, then persist.
    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, FsError>;

    fn write_str(&self, s: &str) -> Result<usize, FsError> {
        self.write(s.as_bytes())
    }

    /// Shrink or zero-extend the payload to `size` bytes, then persist.
    fn truncate(&self, size: u64) -> Result<(), FsError>;

    /// No-op: every mutation has already been persisted.
    fn sync(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Mark the handle closed. Subsequent content operations fail; the
    /// store keeps whatever the last mutation persisted.
    fn close(&self) -> Result<(), FsError>;

    /// Metadata view from the handle's own cached state.
    fn stat(&self) -> Result<FileInfo, FsError>;

    /// Direct children of this path, in key order. A `count` of zero
    /// lists everything.
    fn read_dir(&self, count: usize) -> Result<Vec<FileInfo>, FsError>;

    /// Child names only, in key order.
    fn read_dir_names(&self, count: usize) -> Result<Vec<String>, FsError> {
        Ok(self.read_dir(count)?.into_iter().map(|fi| fi.name).collect())
    }
}

#[derive(Debug)]
struct FileState {
    buffer: Vec<u8>,
    pos: usize,
    meta: FileMeta,
    closed: bool,
}

/// Open handle on a file entity.
#[derive(Debug)]
pub struct SledFile {
    store: Arc<Store>,
    name: String,
    state: Mutex<FileState>,
}

impl SledFile {
    pub(crate) fn new(store: Arc<Store>, name: &str, meta: FileMeta, data: Vec<u8>) -> SledFile {
        SledFile {
            store,
            name: name.to_string(),
            state: Mutex::new(FileState {
                buffer: data,
                pos: 0,
                meta,
                closed: false,
            }),
        }
    }

    fn locked(&self) -> Result<MutexGuard<'_, FileState>, FsError> {
        let state = self.state.lock();
        if state.closed {
            return Err(FsError::Closed(self.name.clone()));
        }
        Ok(state)
    }

    fn persist(&self, state: &FileState) -> Result<(), FsError> {
        self.store.save_file(&self.name, &state.buffer, &state.meta)
    }
}

impl File for SledFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, FsError> {
        let mut state = self.locked()?;
        if state.pos >= state.buffer.len() {
            return Ok(0);
        }
        let start = state.pos;
        let n = (state.buffer.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&state.buffer[start..start + n]);
        state.pos = start + n;
        Ok(n)
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize, FsError> {
        let state = self.locked()?;
        let Ok(offset) = usize::try_from(offset) else {
            return Ok(0);
        };
        if offset >= state.buffer.len() {
            return Ok(0);
        }
        let n = (state.buffer.len() - offset).min(buf.len());
        buf[..n].copy_from_slice(&state.buffer[offset..offset + n]);
        Ok(n)
    }

    fn seek(&self, pos: SeekFrom) -> Result<u64, FsError> {
        let mut state = self.locked()?;
        let abs = match pos {
            SeekFrom::Start(off) => off as i64,
            SeekFrom::Current(off) => state.pos as i64 + off,
            SeekFrom::End(off) => state.buffer.len() as i64 + off,
        };
        if abs < 0 {
            return Err(FsError::InvalidArgument(format!(
                "negative seek position {abs} on {}",
                self.name
            )));
        }
        state.pos = abs as usize;
        Ok(abs as u64)
    }

    fn write(&self, buf: &[u8]) -> Result<usize, FsError> {
        let mut state = self.locked()?;
        state.buffer.extend_from_slice(buf);
        state.meta.size = state.buffer.len() as u64;
        state.meta.mod_time = now_nanos();
        self.persist(&state)?;
        Ok(buf.len())
    }

    fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize, FsError> {
        let mut state = self.locked()?;
        let offset = usize::try_from(offset).map_err(|_| {
            FsError::InvalidArgument(format!("write offset {offset} out of range"))
        })?;
        let end = offset + buf.len();
        if end > state.buffer.len() {
            state.buffer.resize(end, 0);
        }
        state.buffer[offset..end].copy_from_slice(buf);
        state.meta.size = state.buffer.len() as u64;
        state.meta.mod_time = now_nanos();
        self.persist(&state)?;
        Ok(buf.len())
    }

    fn truncate(&self, size: u64) -> Result<(), FsError> {
        let mut state = self.locked()?;
        let size = usize::try_from(size)
            .map_err(|_| FsError::InvalidArgument(format!("truncate size {size} out of range")))?;
        state.buffer.resize(size, 0);
        state.meta.size = size as u64;
        state.meta.mod_time = now_nanos();
        self.persist(&state)
    }

    fn close(&self) -> Result<(), FsError> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn stat(&self) -> Result<FileInfo, FsError> {
        let state = self.state.lock();
        Ok(FileInfo::from_meta(base_name(&self.name), &state.meta))
    }

    fn read_dir(&self, count: usize) -> Result<Vec<FileInfo>, FsError> {
        self.store.read_dir(&self.name, count)
    }
}
