//! Apply in-place attribute modifications to an existing entry.

use tracing::instrument;

use crate::backend::Backend;
use crate::codec;
use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// One modification from a modify request, applied in declared order.
#[derive(Debug, Clone)]
pub enum Mod {
    /// Union `values` into `attr`; a duplicate value fails with
    /// [`Error::TypeOrValueExists`].
    Add { attr: String, values: Vec<String> },
    /// Union `values` into `attr`; a duplicate value is silently ignored.
    SoftAdd { attr: String, values: Vec<String> },
    /// Remove `values` from `attr` (or the whole attribute if `values` is
    /// empty). Any value not present fails with [`Error::NoSuchAttribute`].
    Delete { attr: String, values: Vec<String> },
    /// Replace all of `attr`'s values with `values` (clearing it if empty).
    Replace { attr: String, values: Vec<String> },
    /// Numerically add `delta` to every integer value of `attr`.
    Increment { attr: String, delta: i64 },
}

/// Apply `mods` to the entry at `dn`, in order, then re-validate schema and
/// write the result back. Acquires the exclusive side of the backend's
/// gate for the whole read-modify-write sequence.
#[instrument(skip(backend, mods), fields(dn = %dn))]
pub fn modify(backend: &Backend, dn: &Dn, mods: &[Mod]) -> Result<()> {
    let _guard = backend.gate.write();

    let path = codec::encode(&backend.base_dir, &backend.suffix, dn);
    let bytes = crate::fileio::read_file(&path)
        .map_err(|e| Error::from_read(&path, e))?
        .ok_or(Error::NoSuchObject)?;

    let mut entry = {
        let _codec_guard = backend.gate.codec();
        backend.codec.decode(&bytes)?
    };
    entry.graft_parent(&dn.parent());

    for m in mods {
        apply_one(&mut entry, m)?;
    }

    backend.schema.validate(&entry)?;

    let stored = entry.into_leaf_only_storage_form();
    let out = {
        let _codec_guard = backend.gate.codec();
        backend.codec.encode(&stored)
    };
    crate::fileio::write_atomic(&path, &out).map_err(|e| Error::Other(e.to_string()))
}

pub(crate) fn apply_one(entry: &mut Entry, m: &Mod) -> Result<()> {
    match m {
        Mod::Add { attr, values } => {
            for value in values {
                if !entry.add_value(attr, value.clone()) {
                    return Err(Error::TypeOrValueExists);
                }
            }
            Ok(())
        }
        Mod::SoftAdd { attr, values } => {
            for value in values {
                entry.add_value(attr, value.clone());
            }
            Ok(())
        }
        Mod::Delete { attr, values } => {
            if values.is_empty() {
                if !entry.remove_attribute(attr) {
                    return Err(Error::NoSuchAttribute);
                }
                return Ok(());
            }
            for value in values {
                if !entry.remove_value(attr, value) {
                    return Err(Error::NoSuchAttribute);
                }
            }
            Ok(())
        }
        Mod::Replace { attr, values } => {
            entry.replace_values(attr, values.clone());
            Ok(())
        }
        Mod::Increment { attr, delta } => {
            let current = entry.values(attr).to_vec();
            if current.is_empty() {
                return Err(Error::NoSuchAttribute);
            }
            let mut incremented = Vec::with_capacity(current.len());
            for value in current {
                let n: i64 = value
                    .parse()
                    .map_err(|_| Error::Other(format!("{attr} value {value:?} is not an integer")))?;
                incremented.push((n + delta).to_string());
            }
            entry.replace_values(attr, incremented);
            Ok(())
        }
    }
}
