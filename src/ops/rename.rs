//! Move/rename an entry, optionally to a new parent, with DN-affecting
//! attribute updates carried along.

use tracing::{error, instrument};

use crate::backend::Backend;
use crate::codec;
use crate::dn::Dn;
use crate::error::{Error, Result};
use crate::ops::modify::Mod;

/// Rename the entry at `dn` to `new_rdn`, optionally moving it under
/// `new_superior`, applying `rename_mods` (typically replacing the naming
/// attribute) to the in-memory entry before it is re-validated and written
/// under its new name.
///
/// Renames the sibling subtree directory to the new location *before*
/// unlinking the old entry file, reverting the directory rename if the
/// unlink then fails — this narrows, but does not eliminate, the window in
/// which a crash mid-operation leaves an orphaned subtree directory (see
/// the crate's top-level docs for the remaining gap). Returns the entry's
/// new DN on success. Acquires the exclusive side of the backend's gate.
#[instrument(skip(backend, rename_mods), fields(dn = %dn))]
pub fn rename(
    backend: &Backend,
    dn: &Dn,
    new_rdn: Dn,
    new_superior: Option<Dn>,
    rename_mods: &[Mod],
) -> Result<Dn> {
    let _guard = backend.gate.write();

    let old_path = codec::encode(&backend.base_dir, &backend.suffix, dn);
    let bytes = crate::fileio::read_file(&old_path)
        .map_err(|e| Error::from_read(&old_path, e))?
        .ok_or(Error::NoSuchObject)?;

    let new_superior_dn = match new_superior {
        Some(superior) => {
            let superior_path = codec::encode(&backend.base_dir, &backend.suffix, &superior);
            if !crate::fileio::exists(&superior_path).map_err(|e| Error::from_read(&superior_path, e))? {
                return Err(Error::NoSuchObject);
            }
            superior
        }
        None => dn.parent(),
    };

    let mut entry = {
        let _codec_guard = backend.gate.codec();
        backend.codec.decode(&bytes)?
    };

    let leaf_rdn = new_rdn.leaf().unwrap_or_default().to_string();
    entry.normalized_name = new_superior_dn.with_leaf(&Dn::from_components(vec![leaf_rdn.clone()]));
    entry.name = entry.normalized_name.to_string();

    for m in rename_mods {
        super::modify::apply_one(&mut entry, m)?;
    }

    backend.schema.validate(&entry)?;

    let new_path = codec::encode(&backend.base_dir, &backend.suffix, &entry.normalized_name);
    let (new_entry_file, new_subtree_dir) = codec::sibling_pair(&new_path);
    let (old_entry_file, old_subtree_dir) = codec::sibling_pair(&old_path);

    if crate::fileio::exists(&new_entry_file).map_err(|e| Error::from_read(&new_entry_file, e))? {
        return Err(Error::AlreadyExists);
    }

    let stored = entry.into_leaf_only_storage_form();
    let out = {
        let _codec_guard = backend.gate.codec();
        backend.codec.encode(&stored)
    };
    crate::fileio::write_atomic(&new_entry_file, &out).map_err(|e| Error::Other(e.to_string()))?;

    let had_children = crate::fileio::exists(&old_subtree_dir).map_err(|e| Error::from_read(&old_subtree_dir, e))?;
    if had_children {
        if let Err(err) = std::fs::rename(&old_subtree_dir, &new_subtree_dir) {
            error!(error = %err, "failed to move subtree directory during rename");
        } else if let Err(err) = std::fs::remove_file(&old_entry_file) {
            error!(error = %err, "failed to unlink old entry file during rename, reverting directory move");
            if let Err(revert_err) = std::fs::rename(&new_subtree_dir, &old_subtree_dir) {
                error!(error = %revert_err, "failed to revert subtree directory move after unlink failure");
            }
        }
    } else if let Err(err) = std::fs::remove_file(&old_entry_file) {
        error!(error = %err, "failed to unlink old entry file during rename");
    }

    Ok(entry.normalized_name)
}
