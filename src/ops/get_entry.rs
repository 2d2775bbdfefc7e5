//! Read a single entry by DN.

use tracing::instrument;

use crate::backend::Backend;
use crate::codec;
use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::{Error, Result};

/// Read and reconstruct the entry at `dn`.
///
/// Acquires the shared side of the backend's gate. The entry file on disk
/// stores only its own leaf-only DN (the full suffix DN, for the suffix
/// entry itself); the parent DN inherited from `dn`'s position in the
/// namespace is spliced back in here.
#[instrument(skip(backend), fields(dn = %dn))]
pub fn get_entry(backend: &Backend, dn: &Dn) -> Result<Entry> {
    if !dn.has_suffix(&backend.suffix) {
        return Err(Error::NoSuchObject);
    }

    let _guard = backend.gate.read();
    let path = codec::encode(&backend.base_dir, &backend.suffix, dn);
    let bytes = crate::fileio::read_file(&path)
        .map_err(|e| Error::from_read(&path, e))?
        .ok_or(Error::NoSuchObject)?;

    let mut entry = backend.codec.decode(&bytes)?;
    entry.graft_parent(&dn.parent());
    Ok(entry)
}
