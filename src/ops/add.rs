//! Create a new entry.

use std::fs;

use tracing::{instrument, warn};

use crate::backend::Backend;
use crate::codec;
use crate::entry::Entry;
use crate::error::{Error, Result};

#[cfg(unix)]
const SUBTREE_DIR_MODE: u32 = 0o750;

/// Create `entry` at its normalized DN.
///
/// Generating operational attributes is the caller's responsibility.
/// Acquires the exclusive side of the backend's gate.
#[instrument(skip(backend, entry), fields(dn = %entry.normalized_name))]
pub fn add(backend: &Backend, entry: Entry) -> Result<()> {
    if !entry.normalized_name.has_suffix(&backend.suffix) {
        return Err(Error::NoSuchObject);
    }
    backend.schema.validate(&entry)?;

    let _guard = backend.gate.write();
    let path = codec::encode(&backend.base_dir, &backend.suffix, &entry.normalized_name);
    let (entry_file, _subtree_dir) = codec::sibling_pair(&path);

    ensure_parent_exists(backend, &path)?;

    if crate::fileio::exists(&entry_file).map_err(|e| Error::from_read(&entry_file, e))? {
        return Err(Error::AlreadyExists);
    }

    let stored = entry.into_leaf_only_storage_form();
    let bytes = {
        let _codec_guard = backend.gate.codec();
        backend.codec.encode(&stored)
    };
    crate::fileio::write_atomic(&entry_file, &bytes).map_err(|e| {
        warn!(error = %e, path = %entry_file.display(), "failed to write entry file");
        Error::Other(e.to_string())
    })
}

/// Verify (and, if needed, create) the directory that will hold `path`
/// itself, by checking the parent entry's own entry file or subtree
/// directory exists. For the suffix entry, the holding directory is
/// `base_dir` itself, which has no parent entry to check.
pub(crate) fn ensure_parent_exists(backend: &Backend, path: &std::path::Path) -> Result<()> {
    let holding_dir = path
        .parent()
        .unwrap_or(&backend.base_dir)
        .to_path_buf();

    if holding_dir == backend.base_dir {
        return create_subtree_dir(&holding_dir);
    }

    if crate::fileio::exists(&holding_dir).map_err(|e| Error::from_read(&holding_dir, e))? {
        return Ok(());
    }

    let (parent_entry_file, _) = codec::sibling_pair(&holding_dir);
    if !crate::fileio::exists(&parent_entry_file).map_err(|e| Error::from_read(&parent_entry_file, e))? {
        return Err(Error::NoSuchObject);
    }

    create_subtree_dir(&holding_dir)
}

#[cfg(unix)]
fn create_subtree_dir(dir: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if crate::fileio::exists(dir).map_err(|e| Error::from_read(dir, e))? {
        return Ok(());
    }
    fs::DirBuilder::new()
        .mode(SUBTREE_DIR_MODE)
        .create(dir)
        .map_err(|e| Error::from_mkdir(dir, e))
}

#[cfg(not(unix))]
fn create_subtree_dir(dir: &std::path::Path) -> Result<()> {
    if crate::fileio::exists(dir).map_err(|e| Error::from_read(dir, e))? {
        return Ok(());
    }
    fs::create_dir(dir).map_err(|e| Error::from_mkdir(dir, e))
}
