//! Safe copy-and-rename helper, used when a rename crosses filesystems:
//! - Copies to a temp file in the destination directory
//! - Fsyncs the temp file and carries the source mtime over
//! - Atomically renames temp -> dest (Windows overwrite-safe)

use filetime::FileTime;
use std::fs::{self, OpenOptions};
use std::path::Path;

use super::atomic::try_atomic_move;
use super::helpers::io_error_with_help;
use super::util;
use crate::errors::Result;

pub(crate) fn safe_copy_and_rename(src: &Path, dest: &Path) -> Result<()> {
    let dest_dir = dest.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dest_dir)
        .map_err(io_error_with_help("create destination directory", dest_dir))?;

    let tmp_path = util::unique_temp_path(dest_dir);

    let copied = fs::copy(src, &tmp_path)
        .and_then(|_| OpenOptions::new().write(true).open(&tmp_path)?.sync_all())
        .map_err(io_error_with_help("copy to temporary file", &tmp_path));
    if let Err(e) = copied {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    if let Ok(meta) = fs::metadata(src) {
        let mtime = FileTime::from_last_modification_time(&meta);
        let _ = filetime::set_file_mtime(&tmp_path, mtime);
    }

    if let Err(e) = try_atomic_move(&tmp_path, dest) {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_error_with_help("rename temporary file into place", dest)(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn copy_lands_content_and_keeps_mtime_without_leftovers() {
        let dir = assert_fs::TempDir::new().unwrap();
        let src = dir.child("src.bin");
        src.write_str("payload").unwrap();
        let past = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(src.path(), past).unwrap();

        let dest = dir.child("out").child("dest.bin");
        safe_copy_and_rename(src.path(), dest.path()).unwrap();

        assert_eq!(fs::read_to_string(dest.path()).unwrap(), "payload");
        let meta = fs::metadata(dest.path()).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta), past);
        for entry in fs::read_dir(dir.child("out").path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "temp file left behind: {name}");
        }
    }
}
