//! Verify simple-bind credentials against an entry.

use tracing::instrument;

use crate::backend::Backend;
use crate::dn::Dn;
use crate::error::{Error, Result};

/// Authenticate `dn` with `credentials` via the backend's
/// [`crate::hooks::PasswordVerifier`]. Acquires the shared side of the
/// backend's gate.
///
/// A missing entry is reported as [`Error::InvalidCredentials`], not
/// [`Error::NoSuchObject`] — an unauthenticated binder must not learn
/// whether `dn` exists.
#[instrument(skip(backend, credentials), fields(dn = %dn))]
pub fn bind(backend: &Backend, dn: &Dn, credentials: &[u8]) -> Result<()> {
    let entry = super::get_entry(backend, dn).map_err(|err| match err {
        Error::NoSuchObject => Error::InvalidCredentials,
        other => other,
    })?;
    backend.passwords.verify(&entry, credentials)
}
