//! Walk parent DNs outward looking for a referral to redirect to.

use tracing::instrument;

use crate::backend::Backend;
use crate::codec;
use crate::dn::Dn;
use crate::error::{Error, Result};

/// Probe for a referral that should handle `dn` instead of the operation
/// proceeding normally.
///
/// Walks `dn`, then its parent, and so on outward until an entry file is
/// found or the backend's suffix itself has been checked. If the first
/// entry found along that walk is a referral, its URIs are returned. If no
/// entry is found anywhere on the walk (the target and all of its ancestors
/// up to and including the suffix are missing) and the backend has default
/// referrals configured, those are returned instead. Otherwise returns
/// `Ok(None)`: the caller should proceed with the original operation, which
/// will surface its own `NoSuchObject` if nothing is actually there.
///
/// Acquires the shared side of the backend's gate.
#[instrument(skip(backend), fields(dn = %dn))]
pub fn referral_probe(backend: &Backend, dn: &Dn) -> Result<Option<Vec<String>>> {
    let _guard = backend.gate.read();

    let mut current = dn.clone();
    loop {
        let path = codec::encode(&backend.base_dir, &backend.suffix, &current);
        if let Some(bytes) = crate::fileio::read_file(&path).map_err(|e| Error::from_read(&path, e))? {
            let entry = backend.codec.decode(&bytes)?;
            if backend.referrals.is_referral(&entry) {
                return Ok(Some(backend.referrals.referrals_of(&entry)));
            }
            return Ok(None);
        }
        if current == backend.suffix {
            break;
        }
        current = current.parent();
    }

    let defaults = backend.referrals.default_referrals();
    if defaults.is_empty() {
        Ok(None)
    } else {
        Ok(Some(defaults))
    }
}
