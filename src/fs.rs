//! Path Store
//!
//! Translates filesystem-style operations into keyed reads and writes
//! against the two store collections, using full path strings as keys.
//! Directories are metadata-only records; hierarchy is emulated through
//! ordered prefix scans, never through structural entries.

use crate::dir::SledDir;
use crate::error::FsError;
use crate::file::{File, SledFile};
use crate::meta::{datetime_nanos, now_nanos, FileInfo, FileMeta, FileMode, DEFAULT_FILE_MODE};
use crate::store::Store;
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

bitflags! {
    /// Open intent flags accepted by [`Fs::open_file`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        const WRONLY = 1 << 0;
        const RDWR = 1 << 1;
        const CREATE = 1 << 2;
        const APPEND = 1 << 3;
        const TRUNC = 1 << 4;
    }
}

impl OpenFlags {
    /// Flags that make [`Fs::open_file`] delegate to `create`, truncating
    /// any existing content.
    pub fn write_intent(self) -> bool {
        self.intersects(OpenFlags::CREATE | OpenFlags::RDWR | OpenFlags::WRONLY)
    }
}

/// Filesystem surface.
///
/// Any simulated or real filesystem can stand behind this trait; [`SledFs`]
/// is the store-backed implementation.
pub trait Fs: Send + Sync {
    /// Create a file with an empty payload and default mode, replacing any
    /// existing entry at that path, and return an open handle on it.
    fn create(&self, name: &str) -> Result<Box<dyn File>, FsError>;

    /// Create a single directory entry, replacing any existing one.
    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), FsError>;

    /// Create a directory and every missing ancestor, shallowest first.
    /// One write per ancestor; there is no atomicity across the walk.
    fn mkdir_all(&self, path: &str, perm: FileMode) -> Result<(), FsError>;

    /// Open a path: the files collection is checked first, then the dirs
    /// collection; a double miss is `NotFound`.
    fn open(&self, name: &str) -> Result<Box<dyn File>, FsError>;

    /// Open with flags. Any write-intent flag delegates to `create`; there
    /// is no append-preserving open-for-write at this layer.
    fn open_file(
        &self,
        name: &str,
        flags: OpenFlags,
        perm: FileMode,
    ) -> Result<Box<dyn File>, FsError>;

    /// Delete exactly one file key. Deleting an absent key succeeds.
    fn remove(&self, name: &str) -> Result<(), FsError>;

    /// Delete every file key sharing `path` as a byte-level prefix, then
    /// the one dir key equal to `path`. Never fails when nothing matches.
    fn remove_all(&self, path: &str) -> Result<(), FsError>;

    /// Move a file entry to a new key: load, write at the new path, delete
    /// the old. Directories cannot be renamed. Not atomic across steps.
    fn rename(&self, old: &str, new: &str) -> Result<(), FsError>;

    /// Metadata for a path, files collection first, dirs on miss.
    fn stat(&self, name: &str) -> Result<FileInfo, FsError>;

    /// Name this filesystem was opened with (the store path).
    fn name(&self) -> &str;

    /// Replace the mode of a file entry. Directory entries cannot be
    /// changed through this call.
    fn chmod(&self, name: &str, mode: FileMode) -> Result<(), FsError>;

    /// Accepted and discarded: ownership is not part of the persisted
    /// metadata model.
    fn chown(&self, name: &str, uid: u32, gid: u32) -> Result<(), FsError>;

    /// Replace the modification time of a file entry; `atime` is accepted
    /// and discarded.
    fn chtimes(
        &self,
        name: &str,
        atime: DateTime<Utc>,
        mtime: DateTime<Utc>,
    ) -> Result<(), FsError>;

    /// Flush and release the backing store.
    fn close(&self) -> Result<(), FsError>;
}

/// Store-backed filesystem over two ordered key collections.
pub struct SledFs {
    store: Arc<Store>,
    name: String,
}

impl SledFs {
    /// Open or create a filesystem whose backing store lives at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SledFs, FsError> {
        let path = path.as_ref();
        let store = Store::open(path)?;
        debug!(path = %path.display(), "opened filesystem store");
        Ok(SledFs {
            store: Arc::new(store),
            name: path.display().to_string(),
        })
    }
}

impl Fs for SledFs {
    fn create(&self, name: &str) -> Result<Box<dyn File>, FsError> {
        let meta = FileMeta {
            mode: DEFAULT_FILE_MODE,
            size: 0,
            mod_time: now_nanos(),
            is_dir: false,
        };
        self.store.save_file(name, &[], &meta)?;
        debug!(path = name, "created file");
        Ok(Box::new(SledFile::new(
            self.store.clone(),
            name,
            meta,
            Vec::new(),
        )))
    }

    fn mkdir(&self, name: &str, perm: FileMode) -> Result<(), FsError> {
        let meta = FileMeta {
            mode: perm.with_dir_bit(),
            size: 0,
            mod_time: now_nanos(),
            is_dir: true,
        };
        self.store.save_dir(name, &meta)?;
        debug!(path = name, "created directory");
        Ok(())
    }

    fn mkdir_all(&self, path: &str, perm: FileMode) -> Result<(), FsError> {
        let mut dir = String::new();
        for segment in clean_segments(path) {
            if !dir.is_empty() {
                dir.push('/');
            }
            dir.push_str(segment);
            match self.mkdir(&dir, perm) {
                Ok(()) | Err(FsError::AlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn open(&self, name: &str) -> Result<Box<dyn File>, FsError> {
        match self.store.load_file(name) {
            Ok((data, meta)) => {
                return Ok(Box::new(SledFile::new(self.store.clone(), name, meta, data)))
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }
        let meta = self.store.load_dir(name)?;
        Ok(Box::new(SledDir::new(self.store.clone(), name, meta)))
    }

    fn open_file(
        &self,
        name: &str,
        flags: OpenFlags,
        _perm: FileMode,
    ) -> Result<Box<dyn File>, FsError> {
        if flags.write_intent() {
            return self.create(name);
        }
        self.open(name)
    }

    fn remove(&self, name: &str) -> Result<(), FsError> {
        self.store.delete_file(name)?;
        debug!(path = name, "removed file");
        Ok(())
    }

    fn remove_all(&self, path: &str) -> Result<(), FsError> {
        self.store.delete_file_prefix(path)?;
        self.store.delete_dir(path)?;
        debug!(path, "removed subtree");
        Ok(())
    }

    fn rename(&self, old: &str, new: &str) -> Result<(), FsError> {
        let (data, meta) = self.store.load_file(old)?;
        self.store.save_file(new, &data, &meta)?;
        self.store.delete_file(old)?;
        debug!(from = old, to = new, "renamed file");
        Ok(())
    }

    fn stat(&self, name: &str) -> Result<FileInfo, FsError> {
        match self.store.load_file(name) {
            Ok((_, meta)) => Ok(FileInfo::from_meta(base_name(name), &meta)),
            Err(e) if e.is_not_found() => {
                let meta = self.store.load_dir(name)?;
                Ok(FileInfo {
                    name: base_name(name).to_string(),
                    size: 0,
                    mode: meta.mode,
                    mod_time: meta.modified(),
                    is_dir: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn chmod(&self, name: &str, mode: FileMode) -> Result<(), FsError> {
        let (data, mut meta) = self.store.load_file(name)?;
        meta.mode = mode;
        self.store.save_file(name, &data, &meta)
    }

    fn chown(&self, name: &str, uid: u32, gid: u32) -> Result<(), FsError> {
        debug!(path = name, uid, gid, "chown ignored");
        Ok(())
    }

    fn chtimes(
        &self,
        name: &str,
        _atime: DateTime<Utc>,
        mtime: DateTime<Utc>,
    ) -> Result<(), FsError> {
        let (data, mut meta) = self.store.load_file(name)?;
        meta.mod_time = datetime_nanos(mtime);
        self.store.save_file(name, &data, &meta)
    }

    fn close(&self) -> Result<(), FsError> {
        self.store.flush()
    }
}

/// Final segment of a path.
pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Normalized path segments: empty and dot segments dropped, dot-dot
/// segments popping their parent.
fn clean_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments
}
