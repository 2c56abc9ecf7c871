//! Crash-safe file writes
//!
//! Every file the store writes goes through write-fsync-rename:
//!
//! 1. Write to a hidden temporary file next to the target (`.<name>.tmp`)
//! 2. fsync the temporary file
//! 3. Rename it over the target
//! 4. fsync the parent directory (best effort)
//!
//! A crash leaves either the old file or the new one, plus at worst a
//! stray temporary that [`cleanup_temp_files`] removes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const TEMP_SUFFIX: &str = ".tmp";

/// Temporary sibling of `path`
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}{TEMP_SUFFIX}"))
}

/// Atomically replace `path` with `data`
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = temp_path(path);
    let written = (|| {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    sync_parent(path);
    Ok(())
}

/// Atomically copy `src` to `dst`, returning the number of bytes copied
pub(crate) fn copy_atomic(src: &Path, dst: &Path) -> io::Result<u64> {
    let data = fs::read(src)?;
    write_atomic(dst, &data)?;
    Ok(data.len() as u64)
}

/// Remove `path` if present, returning its size
pub(crate) fn remove_file_if_exists(path: &Path) -> io::Result<Option<u64>> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    match fs::remove_file(path) {
        Ok(()) => Ok(Some(len)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove temporaries left behind by interrupted writes in `dir`
pub(crate) fn cleanup_temp_files(dir: &Path) -> io::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') && name.ends_with(TEMP_SUFFIX) {
            fs::remove_file(entry.path())?;
            count += 1;
        }
    }
    Ok(count)
}

// Directory fsync is unsupported on some platforms.
fn sync_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        assert_eq!(
            temp_path(Path::new("/r/graphs/g1.json")),
            PathBuf::from("/r/graphs/.g1.json.tmp")
        );
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("g1.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("g1.json");

        assert!(write_atomic(&path, b"data").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_copy_atomic() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("a");
        let dst = dir.path().join("b");
        fs::write(&src, b"payload").unwrap();

        assert_eq!(copy_atomic(&src, &dst).unwrap(), 7);
        assert_eq!(fs::read(&dst).unwrap(), b"payload");
    }

    #[test]
    fn test_remove_file_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x");
        fs::write(&path, b"12345").unwrap();

        assert_eq!(remove_file_if_exists(&path).unwrap(), Some(5));
        assert_eq!(remove_file_if_exists(&path).unwrap(), None);
    }

    #[test]
    fn test_cleanup_temp_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".g1.json.tmp"), b"partial").unwrap();
        fs::write(dir.path().join("g1.json"), b"whole").unwrap();

        assert_eq!(cleanup_temp_files(dir.path()).unwrap(), 1);
        assert!(dir.path().join("g1.json").exists());
        assert_eq!(cleanup_temp_files(&dir.path().join("absent")).unwrap(), 0);
    }
}
