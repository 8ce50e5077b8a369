//! Filesystem primitives used by the dual-location entities.
//!
//! Each primitive takes the entity's `IoPriority` and holds a `priority::scoped`
//! guard for the duration of the call. Primitives know nothing about
//! primary/secondary; they operate on a single concrete path.

mod atomic;
mod copy;
pub(crate) mod helpers;
mod util;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::priority::{self, IoPriority};

pub use helpers::io_error_with_help;

/// True if `path` currently exists and is a regular file (symlinks followed).
pub fn file_exists(path: &Path, prio: IoPriority) -> bool {
    let _p = priority::scoped(prio);
    path.is_file()
}

/// True if `path` currently exists and is a directory (symlinks followed).
pub fn dir_exists(path: &Path, prio: IoPriority) -> bool {
    let _p = priority::scoped(prio);
    path.is_dir()
}

/// Byte length of a regular file.
pub fn file_len(path: &Path, prio: IoPriority) -> Result<u64> {
    let _p = priority::scoped(prio);
    let meta = fs::metadata(path).map_err(io_error_with_help("stat file", path))?;
    if !meta.is_file() {
        return Err(io_error_with_help("stat file", path)(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(meta.len())
}

/// Read a whole file as UTF-8 text.
pub fn read_text(path: &Path, prio: IoPriority) -> Result<String> {
    let _p = priority::scoped(prio);
    fs::read_to_string(path).map_err(io_error_with_help("read file", path))
}

/// Durably replace `path` with `content`: write a temp sibling, fsync, rename over.
/// Missing parent directories are created.
pub fn write_text(path: &Path, content: &str, prio: IoPriority) -> Result<()> {
    let _p = priority::scoped(prio);
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(io_error_with_help("create parent directory", parent))?;

    let tmp = util::unique_temp_path(parent);
    let written = File::create(&tmp).and_then(|mut f| {
        f.write_all(content.as_bytes())?;
        f.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_error_with_help("write temporary file", &tmp)(e));
    }

    if let Err(e) = atomic::try_atomic_move(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error_with_help("rename temporary file into place", path)(e));
    }
    Ok(())
}

/// Remove a single file. A missing file is an error (kind NotFound).
pub fn remove_file(path: &Path, prio: IoPriority) -> Result<()> {
    let _p = priority::scoped(prio);
    fs::remove_file(path).map_err(io_error_with_help("remove file", path))
}

/// Move `src` to `dst`, replacing any existing `dst`. Creates `dst`'s parent.
/// Falls back to copy + remove when the rename crosses filesystems.
pub fn move_file(src: &Path, dst: &Path, prio: IoPriority) -> Result<()> {
    let _p = priority::scoped(prio);
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .map_err(io_error_with_help("create destination directory", parent))?;
    }

    match atomic::try_atomic_move(src, dst) {
        Ok(()) => {
            debug!(src = %src.display(), dst = %dst.display(), "Renamed file atomically");
            Ok(())
        }
        Err(e) if util::is_cross_device(&e) => {
            warn!(error = %e, src = %src.display(), dst = %dst.display(), "Cross-device rename, using safe copy+rename");
            copy::safe_copy_and_rename(src, dst)?;
            fs::remove_file(src).map_err(io_error_with_help("remove original file", src))
        }
        Err(e) => Err(io_error_with_help("move file", src)(e)),
    }
}

/// Create `path` and any missing ancestors.
pub fn create_dir(path: &Path, prio: IoPriority) -> Result<()> {
    let _p = priority::scoped(prio);
    fs::create_dir_all(path).map_err(io_error_with_help("create directory", path))
}

/// Remove an empty directory (non-recursive). A directory that still holds
/// entries fails with DirectoryNotEmpty naming what was left behind.
pub fn remove_dir(path: &Path, prio: IoPriority) -> Result<()> {
    let _p = priority::scoped(prio);
    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::DirectoryNotEmpty => {
            let left: Vec<String> = fs::read_dir(path)
                .map(|rd| {
                    rd.filter_map(|entry| entry.ok())
                        .map(|entry| entry.file_name().to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default();
            Err(io_error_with_help("remove directory", path)(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("entries left behind: {}", left.join(", ")),
            )))
        }
        Err(e) => Err(io_error_with_help("remove directory", path)(e)),
    }
}

/// Delete leftover temp files from interrupted writes directly inside `dir`.
/// Returns how many were removed. A missing `dir` removes nothing.
pub fn remove_stale_temp_files(dir: &Path, prio: IoPriority) -> Result<usize> {
    let _p = priority::scoped(prio);
    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(io_error_with_help("list directory", dir)(e)),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry.map_err(io_error_with_help("read directory entry", dir))?;
        let is_temp = entry.file_name().to_str().is_some_and(is_temp_name);
        if !is_temp || !entry.path().is_file() {
            continue;
        }
        let path = entry.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed stale temp file");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error_with_help("remove stale temp file", &path)(e)),
        }
    }
    Ok(removed)
}

/// Remove a directory tree. Returns Ok(false) when nothing was there.
pub fn remove_tree(path: &Path, prio: IoPriority) -> Result<bool> {
    let _p = priority::scoped(prio);
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_error_with_help("remove directory tree", path)(e)),
    }
}

/// Names of regular files directly inside `dir`. In-flight temp files are skipped.
pub fn list_file_names(dir: &Path, prio: IoPriority) -> Result<Vec<String>> {
    list_names(dir, prio, |p| p.is_file())
}

/// Names of directories directly inside `dir`.
pub fn list_dir_names(dir: &Path, prio: IoPriority) -> Result<Vec<String>> {
    list_names(dir, prio, |p| p.is_dir())
}

fn list_names(dir: &Path, prio: IoPriority, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>> {
    let _p = priority::scoped(prio);
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error_with_help("list directory", dir))? {
        let entry = entry.map_err(io_error_with_help("read directory entry", dir))?;
        let path = entry.path();
        if !keep(&path) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_temp_name(&name) => {}
            Ok(name) => names.push(name),
            Err(raw) => {
                warn!(dir = %dir.display(), name = ?raw, "Skipping entry with non UTF-8 name");
            }
        }
    }
    names.sort();
    Ok(names)
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with(".dual_tier.") && name.ends_with(".tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn write_text_creates_parents_and_replaces() {
        let dir = assert_fs::TempDir::new().unwrap();
        let target = dir.child("a").child("b").child("f.txt");
        write_text(target.path(), "one", IoPriority::Inherit).unwrap();
        write_text(target.path(), "two", IoPriority::Low).unwrap();
        assert_eq!(read_text(target.path(), IoPriority::Inherit).unwrap(), "two");
        assert_eq!(list_file_names(dir.child("a").child("b").path(), IoPriority::Inherit).unwrap(), vec!["f.txt"]);
    }

    #[test]
    fn listing_splits_files_and_dirs_and_hides_temp_files() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("x.txt").write_str("x").unwrap();
        dir.child(".dual_tier.1.2.3.tmp").write_str("partial").unwrap();
        dir.child("sub").create_dir_all().unwrap();
        assert_eq!(list_file_names(dir.path(), IoPriority::Inherit).unwrap(), vec!["x.txt"]);
        assert_eq!(list_dir_names(dir.path(), IoPriority::Inherit).unwrap(), vec!["sub"]);
    }

    #[test]
    fn stale_temp_files_are_cleared_before_removing_dir() {
        let dir = assert_fs::TempDir::new().unwrap();
        let node = dir.child("node");
        node.child(".dual_tier.9.9.9.tmp").write_str("partial").unwrap();
        assert_eq!(remove_stale_temp_files(node.path(), IoPriority::Inherit).unwrap(), 1);
        remove_dir(node.path(), IoPriority::Inherit).unwrap();
        assert!(!node.path().exists());
        assert_eq!(remove_stale_temp_files(node.path(), IoPriority::Inherit).unwrap(), 0);
    }

    #[test]
    fn remove_dir_names_what_was_left_behind() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("node/keep.me").write_str("x").unwrap();
        let err = remove_dir(dir.child("node").path(), IoPriority::Inherit).unwrap_err();
        assert!(err.to_string().contains("keep.me"), "{err}");
    }

    #[test]
    fn listing_missing_dir_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let err = list_file_names(&dir.path().join("missing"), IoPriority::Inherit).unwrap_err();
        assert!(err.is_io_not_found());
    }

    #[test]
    fn move_file_overwrites_and_creates_parent() {
        let dir = assert_fs::TempDir::new().unwrap();
        let src = dir.child("p").child("f.txt");
        src.write_str("fresh").unwrap();
        let dst = dir.child("s").child("f.txt");
        move_file(src.path(), dst.path(), IoPriority::Inherit).unwrap();
        assert!(!src.path().exists());
        assert_eq!(fs::read_to_string(dst.path()).unwrap(), "fresh");

        src.write_str("newer").unwrap();
        move_file(src.path(), dst.path(), IoPriority::Inherit).unwrap();
        assert_eq!(fs::read_to_string(dst.path()).unwrap(), "newer");
    }

    #[test]
    fn remove_tree_reports_missing() {
        let dir = assert_fs::TempDir::new().unwrap();
        let t = dir.child("t");
        t.child("deep").child("f").write_str("x").unwrap();
        assert!(remove_tree(t.path(), IoPriority::Inherit).unwrap());
        assert!(!remove_tree(t.path(), IoPriority::Inherit).unwrap());
    }

    #[test]
    fn file_len_rejects_directories() {
        let dir = assert_fs::TempDir::new().unwrap();
        assert!(file_len(dir.path(), IoPriority::Inherit).is_err());
        let f = dir.child("f.bin");
        f.write_binary(&[0u8; 42]).unwrap();
        assert_eq!(file_len(f.path(), IoPriority::Inherit).unwrap(), 42);
    }
}
