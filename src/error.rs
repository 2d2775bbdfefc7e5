//! Directory-service result codes returned by every backend operation.

use std::fmt;
use std::io;
use std::path::Path;

use tracing::debug;

/// Errors returned by [`crate::Backend`] operations.
///
/// The variant set mirrors the standard directory-service error taxonomy
/// rather than wrapping [`io::Error`] directly, so callers can match on
/// meaning instead of on `io::ErrorKind`.
#[derive(Debug)]
pub enum Error {
    /// No entry exists at the requested DN, or a required parent is missing.
    NoSuchObject,
    /// An entry already exists at the target path.
    AlreadyExists,
    /// Bind failed: entry missing, password attribute missing, or comparison failed.
    InvalidCredentials,
    /// The entry has no means of the requested authentication at all.
    InappropriateAuth,
    /// The caller lacks permission to perform the operation.
    InsufficientAccess,
    /// The operation is not something this backend will perform.
    UnwillingToPerform,
    /// Attempted to delete an entry that still has children.
    NotAllowedOnNonLeaf,
    /// A modify ADD targeted a value that is already present.
    TypeOrValueExists,
    /// A modify DELETE targeted an attribute or value that is not present.
    NoSuchAttribute,
    /// A directory could not be opened for reasons other than non-existence.
    Busy,
    /// The operation should be retried against the returned referral URIs.
    Referral(Vec<String>),
    /// An I/O or internal error that does not map to any of the above.
    Other(String),
}

impl Error {
    /// Map a filesystem read/stat error: missing-file becomes [`Error::NoSuchObject`].
    ///
    /// Any other kind is logged at debug level with `path` before being
    /// reported as [`Error::Other`], so an operator can correlate a
    /// surfaced `Other` against the underlying I/O failure.
    pub fn from_read(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Error::NoSuchObject
        } else {
            debug!(path = %path.display(), error = %err, "unmapped read/stat error");
            Error::Other(err.to_string())
        }
    }

    /// Map a filesystem error encountered while creating a parent directory.
    pub fn from_mkdir(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Error::NoSuchObject
        } else {
            debug!(path = %path.display(), error = %err, "unmapped mkdir error");
            Error::Other(err.to_string())
        }
    }

    /// Map a directory-removal error: not-empty becomes [`Error::NotAllowedOnNonLeaf`].
    pub fn from_rmdir(path: &Path, err: io::Error) -> Option<Self> {
        match err.kind() {
            io::ErrorKind::NotFound => None,
            _ if is_not_empty(&err) => Some(Error::NotAllowedOnNonLeaf),
            _ => {
                debug!(path = %path.display(), error = %err, "unmapped rmdir error");
                Some(Error::Other(err.to_string()))
            }
        }
    }

    /// Map a file-unlink error: missing-file becomes [`Error::NoSuchObject`].
    pub fn from_unlink(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Error::NoSuchObject
        } else {
            debug!(path = %path.display(), error = %err, "unmapped unlink error");
            Error::Other(err.to_string())
        }
    }
}

/// `ENOTEMPTY`/`ERROR_DIR_NOT_EMPTY` is not yet a stable [`io::ErrorKind`] variant,
/// so recognize it from the platform `raw_os_error`.
fn is_not_empty(err: &io::Error) -> bool {
    match err.raw_os_error() {
        #[cfg(unix)]
        Some(code) => code == libc_enotempty(),
        #[cfg(not(unix))]
        Some(_) => err.to_string().to_lowercase().contains("not empty"),
        None => false,
    }
}

#[cfg(all(
    unix,
    any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )
))]
fn libc_enotempty() -> i32 {
    // The BSD family (macOS/iOS inherit their libc from Darwin, itself a
    // BSD descendant) numbers ENOTEMPTY 66, not glibc's 39.
    66
}

#[cfg(all(
    unix,
    not(any(
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))
))]
fn libc_enotempty() -> i32 {
    // ENOTEMPTY is 39 on Linux and the other non-BSD Unixes this crate targets.
    39
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoSuchObject => write!(f, "no such object"),
            Error::AlreadyExists => write!(f, "entry already exists"),
            Error::InvalidCredentials => write!(f, "invalid credentials"),
            Error::InappropriateAuth => write!(f, "inappropriate authentication"),
            Error::InsufficientAccess => write!(f, "insufficient access"),
            Error::UnwillingToPerform => write!(f, "unwilling to perform"),
            Error::NotAllowedOnNonLeaf => write!(f, "not allowed on non-leaf entry"),
            Error::TypeOrValueExists => write!(f, "attribute type or value exists"),
            Error::NoSuchAttribute => write!(f, "no such attribute"),
            Error::Busy => write!(f, "backend busy"),
            Error::Referral(uris) => write!(f, "referral: {}", uris.join(", ")),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
