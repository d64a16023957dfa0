//! Integration tests exercising the full filesystem surface against a
//! temporary backing store.

use chrono::{Duration, Utc};
use sledfs::{File, FileMode, Fs, FsError, OpenFlags, SledFs};
use std::sync::Arc;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once so RUST_LOG selects which store
/// events show up in test output.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn open_fs() -> (TempDir, SledFs) {
    init_logging();
    let dir = TempDir::new().expect("tempdir");
    let fs = SledFs::open(dir.path().join("store")).expect("open filesystem");
    (dir, fs)
}

#[test]
fn test_create_write_read() {
    let (_dir, fs) = open_fs();

    let f = fs.create("test.txt").unwrap();
    let want = "hello, sledfs!";
    let n = f.write_str(want).unwrap();
    assert_eq!(n, want.len());
    f.close().unwrap();

    let f2 = fs.open("test.txt").unwrap();
    let mut buf = [0u8; 100];
    let n = f2.read(&mut buf).unwrap();
    assert_eq!(n, want.len());
    assert_eq!(&buf[..n], want.as_bytes());
    f2.close().unwrap();
}

#[test]
fn test_reopen_round_trip() {
    let (dir, fs) = open_fs();
    let path = dir.path().join("store");

    let f = fs.create("persist.txt").unwrap();
    f.write(b"survives close and reopen").unwrap();
    f.close().unwrap();
    fs.close().unwrap();
    drop(fs);

    let fs = SledFs::open(&path).unwrap();
    let f = fs.open("persist.txt").unwrap();
    let mut buf = [0u8; 64];
    let n = f.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"survives close and reopen");
}

#[test]
fn test_mkdir_mkdir_all_stat() {
    let (_dir, fs) = open_fs();

    fs.mkdir("dir", FileMode(0o755)).unwrap();
    fs.mkdir_all("a/b/c", FileMode(0o755)).unwrap();

    for path in ["dir", "a", "a/b", "a/b/c"] {
        let info = fs.stat(path).unwrap();
        assert!(info.is_dir, "{path} should be a directory");
        assert!(info.mode.is_dir());
        assert_eq!(info.size, 0);
    }
    assert_eq!(fs.stat("a/b/c").unwrap().name, "c");
}

#[test]
fn test_create_does_not_create_ancestors() {
    let (_dir, fs) = open_fs();

    let f = fs.create("x/y/f.txt").unwrap();
    f.close().unwrap();
    // Directory entries are independent facts; nothing created them.
    assert!(fs.stat("x").unwrap_err().is_not_found());
    assert!(fs.stat("x/y").unwrap_err().is_not_found());
    assert!(!fs.stat("x/y/f.txt").unwrap().is_dir);
}

#[test]
fn test_remove_and_remove_all() {
    let (_dir, fs) = open_fs();

    fs.create("foo.txt").unwrap().close().unwrap();
    fs.remove("foo.txt").unwrap();
    assert!(fs.open("foo.txt").unwrap_err().is_not_found());

    // Removing a missing key is still a success.
    fs.remove("foo.txt").unwrap();

    fs.mkdir_all("d1/d2", FileMode(0o755)).unwrap();
    fs.create("d1/d2/f1.txt").unwrap().close().unwrap();
    fs.create("d1/d2/f2.txt").unwrap().close().unwrap();
    fs.remove_all("d1").unwrap();
    assert!(fs.open("d1/d2/f1.txt").unwrap_err().is_not_found());
    assert!(fs.open("d1/d2/f2.txt").unwrap_err().is_not_found());
    assert!(fs.stat("d1").unwrap_err().is_not_found());

    // No match at all is fine too.
    fs.remove_all("nothing/here").unwrap();
}

#[test]
fn test_remove_all_matches_byte_prefix() {
    let (_dir, fs) = open_fs();

    fs.mkdir("ab", FileMode(0o755)).unwrap();
    fs.create("ab/inner.txt").unwrap().close().unwrap();
    fs.create("abc.txt").unwrap().close().unwrap();

    fs.remove_all("ab").unwrap();
    assert!(fs.open("ab/inner.txt").unwrap_err().is_not_found());
    // The prefix match is byte-level, not segment-aware: the sibling whose
    // name merely starts with "ab" is deleted as well.
    assert!(fs.open("abc.txt").unwrap_err().is_not_found());
}

#[test]
fn test_rename() {
    let (_dir, fs) = open_fs();

    let f = fs.create("old.txt").unwrap();
    f.write_str("data").unwrap();
    f.close().unwrap();

    fs.rename("old.txt", "new.txt").unwrap();
    assert!(fs.open("old.txt").unwrap_err().is_not_found());

    let f2 = fs.open("new.txt").unwrap();
    let mut buf = [0u8; 10];
    let n = f2.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"data");
}

#[test]
fn test_rename_missing_or_directory_fails() {
    let (_dir, fs) = open_fs();

    assert!(fs.rename("absent.txt", "new.txt").unwrap_err().is_not_found());

    fs.mkdir("onlydir", FileMode(0o755)).unwrap();
    assert!(fs.rename("onlydir", "moved").unwrap_err().is_not_found());
}

#[test]
fn test_chmod_chtimes() {
    let (_dir, fs) = open_fs();

    fs.create("chmod.txt").unwrap().close().unwrap();
    fs.chmod("chmod.txt", FileMode(0o400)).unwrap();
    let info = fs.stat("chmod.txt").unwrap();
    assert_eq!(info.mode.perm(), 0o400);

    let t = Utc::now() - Duration::hours(1);
    fs.chtimes("chmod.txt", Utc::now(), t).unwrap();
    let info = fs.stat("chmod.txt").unwrap();
    assert_eq!(info.mod_time, t);
}

#[test]
fn test_chmod_chtimes_reject_directories_and_missing() {
    let (_dir, fs) = open_fs();

    fs.mkdir("d", FileMode(0o755)).unwrap();
    assert!(fs.chmod("d", FileMode(0o700)).unwrap_err().is_not_found());
    assert!(fs
        .chtimes("d", Utc::now(), Utc::now())
        .unwrap_err()
        .is_not_found());
    assert!(fs.chmod("missing", FileMode(0o700)).unwrap_err().is_not_found());
}

#[test]
fn test_chown_is_accepted_and_ignored() {
    let (_dir, fs) = open_fs();
    fs.create("owned.txt").unwrap().close().unwrap();
    fs.chown("owned.txt", 1000, 1000).unwrap();
    // Even paths that do not exist succeed; nothing is persisted.
    fs.chown("missing.txt", 0, 0).unwrap();
}

#[test]
fn test_readdir_and_readdirnames() {
    let (_dir, fs) = open_fs();

    fs.mkdir_all("dir/sub", FileMode(0o755)).unwrap();
    fs.create("dir/a.txt").unwrap().close().unwrap();
    fs.create("dir/b.txt").unwrap().close().unwrap();
    fs.create("dir/c.txt").unwrap().close().unwrap();
    fs.create("dir/sub/nested.txt").unwrap().close().unwrap();
    fs.create("top.txt").unwrap().close().unwrap();

    let d = fs.open("dir").unwrap();
    let infos = d.read_dir(0).unwrap();
    let names: Vec<&str> = infos.iter().map(|fi| fi.name.as_str()).collect();
    // Key order is lexicographic; nested entries and outside entries are
    // excluded.
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    assert!(infos.iter().all(|fi| !fi.is_dir));

    let limited = d.read_dir_names(2).unwrap();
    assert_eq!(limited, vec!["a.txt", "b.txt"]);
}

#[test]
fn test_readdir_on_file_handle_uses_own_path_as_prefix() {
    let (_dir, fs) = open_fs();

    fs.create("f.txt").unwrap().close().unwrap();
    fs.create("f.txt/child").unwrap().close().unwrap();

    let f = fs.open("f.txt").unwrap();
    let names = f.read_dir_names(0).unwrap();
    assert_eq!(names, vec!["child"]);
}

#[test]
fn test_truncate_shrink() {
    let (_dir, fs) = open_fs();

    let f = fs.create("trunc.txt").unwrap();
    f.write_str("1234567890").unwrap();
    f.truncate(5).unwrap();
    f.close().unwrap();

    let f2 = fs.open("trunc.txt").unwrap();
    let mut buf = [0u8; 10];
    let n = f2.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"12345");
}

#[test]
fn test_truncate_extend_zero_fills() {
    let (_dir, fs) = open_fs();

    let f = fs.create("grow.txt").unwrap();
    f.write_str("abc").unwrap();
    f.truncate(6).unwrap();
    f.close().unwrap();

    let f2 = fs.open("grow.txt").unwrap();
    let mut buf = [0u8; 10];
    let n = f2.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"abc\0\0\0");
    assert_eq!(f2.stat().unwrap().size, 6);
}

#[test]
fn test_create_overwrites_existing_content() {
    let (_dir, fs) = open_fs();

    let f = fs.create("again.txt").unwrap();
    f.write_str("first contents").unwrap();
    f.close().unwrap();

    // Last writer wins: create never checks for existence.
    fs.create("again.txt").unwrap().close().unwrap();
    let info = fs.stat("again.txt").unwrap();
    assert_eq!(info.size, 0);
}

#[test]
fn test_open_file_write_intent_truncates() {
    let (_dir, fs) = open_fs();

    let f = fs.create("flags.txt").unwrap();
    f.write_str("keep me?").unwrap();
    f.close().unwrap();

    let f = fs
        .open_file("flags.txt", OpenFlags::CREATE, FileMode(0o644))
        .unwrap();
    assert_eq!(f.stat().unwrap().size, 0);
    f.close().unwrap();

    // Read-only open preserves content.
    let f = fs.create("flags.txt").unwrap();
    f.write_str("kept").unwrap();
    f.close().unwrap();
    let f = fs
        .open_file("flags.txt", OpenFlags::empty(), FileMode(0o644))
        .unwrap();
    let mut buf = [0u8; 8];
    let n = f.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"kept");
}

#[test]
fn test_directory_handle_rejects_content_operations() {
    let (_dir, fs) = open_fs();

    fs.mkdir("ro", FileMode(0o755)).unwrap();
    let d = fs.open("ro").unwrap();

    let mut buf = [0u8; 4];
    assert!(matches!(d.read(&mut buf), Err(FsError::InvalidOperation(_))));
    assert!(matches!(d.write(b"x"), Err(FsError::InvalidOperation(_))));
    assert!(matches!(d.write_str("x"), Err(FsError::InvalidOperation(_))));
    assert!(matches!(d.truncate(0), Err(FsError::InvalidOperation(_))));
    assert!(matches!(
        d.seek(std::io::SeekFrom::Start(0)),
        Err(FsError::InvalidOperation(_))
    ));

    let info = d.stat().unwrap();
    assert!(info.is_dir);
    assert_eq!(info.name, "ro");
    d.sync().unwrap();
    d.close().unwrap();
}

#[test]
fn test_stat_missing_path() {
    let (_dir, fs) = open_fs();
    assert!(fs.stat("nowhere.txt").unwrap_err().is_not_found());
}

#[test]
fn test_fs_name_reports_store_path() {
    let (dir, fs) = open_fs();
    let expect = dir.path().join("store");
    assert_eq!(fs.name(), expect.display().to_string());
}

#[test]
fn test_concurrent_writers_on_distinct_paths() {
    let (_dir, fs) = open_fs();
    let fs = Arc::new(fs);

    let mut handles = Vec::new();
    for i in 0..8 {
        let fs = fs.clone();
        handles.push(std::thread::spawn(move || {
            let path = format!("par/{i}.txt");
            let f = fs.create(&path).unwrap();
            f.write_str(&format!("writer {i}")).unwrap();
            f.close().unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    for i in 0..8 {
        let f = fs.open(&format!("par/{i}.txt")).unwrap();
        let mut buf = [0u8; 16];
        let n = f.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], format!("writer {i}").as_bytes());
    }
}

#[test]
fn test_last_persisted_write_wins_across_handles() {
    let (_dir, fs) = open_fs();

    fs.create("race.txt").unwrap().close().unwrap();
    let a = fs.open("race.txt").unwrap();
    let b = fs.open("race.txt").unwrap();

    a.write_str("from a").unwrap();
    b.write_str("from b").unwrap();

    let f = fs.open("race.txt").unwrap();
    let mut buf = [0u8; 16];
    let n = f.read(&mut buf).unwrap();
    // Handle buffers are private; b never saw a's bytes, so its flush is
    // the whole stored payload.
    assert_eq!(&buf[..n], b"from b");
}
