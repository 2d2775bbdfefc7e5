//! Read-file, stat-only-exists, and write-atomically-via-rename primitives.
//!
//! Every entry mutation in this crate goes through [`write_atomic`]: readers
//! must never be able to observe a half-written entry file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Read the full contents of the entry file at `path`.
///
/// Returns `Ok(None)` if the file does not exist, `Err` for any other I/O
/// failure.
pub fn read_file(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Stat-only existence probe; does not read file contents.
pub fn exists(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Write `bytes` to `path` so that readers never observe a partial write.
///
/// Creates a uniquely-named temporary file alongside `path`, writes and
/// flushes it, then renames it over `path`. The temporary file is removed on
/// any failure before the rename. `std::io::Write::write_all` already loops
/// through `ErrorKind::Interrupted`, so no bespoke EINTR retry is needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let (tmp_path, mut tmp_file) = create_temp_file(dir, path)?;

    let result = tmp_file.write_all(bytes).and_then(|_| tmp_file.flush());
    drop(tmp_file);

    match result {
        Ok(()) => fs::rename(&tmp_path, path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp_path);
        }),
        Err(err) => {
            let _ = fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}

/// Create a uniquely-named temporary file in `dir`, named after `target`'s
/// stem so failures are easy to spot during manual inspection of `dir`.
fn create_temp_file(dir: &Path, target: &Path) -> io::Result<(PathBuf, File)> {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("entry");

    for attempt in 0..64u32 {
        let candidate = dir.join(format!(".{stem}.{}.tmp", tmp_suffix(attempt)));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "could not allocate a unique temporary filename",
    ))
}

fn tmp_suffix(attempt: u32) -> String {
    let pid = std::process::id();
    let nonce = (&attempt as *const u32 as usize) ^ (pid as usize);
    format!("{pid:x}-{attempt:x}-{nonce:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_file_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.ldif");
        assert!(read_file(&path).unwrap().is_none());
    }

    #[test]
    fn write_then_read_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entry.ldif");
        write_atomic(&path, b"dn: cn=x\n").unwrap();
        assert_eq!(read_file(&path).unwrap().unwrap(), b"dn: cn=x\n");
    }

    #[test]
    fn write_atomic_overwrites_without_partial_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entry.ldif");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(read_file(&path).unwrap().unwrap(), b"second");

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp file was not cleaned up");
    }

    #[test]
    fn exists_reflects_presence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entry.ldif");
        assert!(!exists(&path).unwrap());
        write_atomic(&path, b"x").unwrap();
        assert!(exists(&path).unwrap());
    }
}
