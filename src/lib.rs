//! A filesystem-backed directory storage backend: entries addressed by a
//! Distinguished Name are persisted as individual text files, one per
//! entry, arranged in a tree that mirrors the namespace.
//!
//! The crate is organized leaf-first, the way the operation layer composes
//! it:
//!
//! - [`dn`] — the lexical `Dn` model, out-of-scope attribute-syntax parsing
//!   excluded.
//! - [`codec`] — the bijective DN-to-path encoding (§3/§4.1 of the design).
//! - [`fileio`] — read/exists/write-atomically-via-rename primitives.
//! - [`enumerator`] — the recursive subtree walk behind every search.
//! - [`lock`] — the per-backend reader/writer gate plus the codec mutex.
//! - [`entry`] and [`hooks`] — the in-memory entry value type and the
//!   pluggable external collaborators (serialization, schema, credentials,
//!   referrals) the backend itself does not implement.
//! - [`ops`] — `add`, `modify`, `delete`, `rename`, `bind`, `search`, and
//!   `referral_probe`, each composing the layers above under the gate.
//! - [`config`] and [`backend`] — configuration loading and the `Backend`
//!   type tying everything together.
//! - [`tool`] — the batch export/import cursor used by the
//!   `entrystore-tool` binary.
//!
//! Everything below this crate is synchronous: every operation blocks the
//! calling thread for the duration of its filesystem I/O. There is no
//! internal scheduling and no background threads; concurrency is whatever
//! the caller provides by invoking operations from multiple threads, which
//! is why every mutation is serialized through [`lock::Gate`].

pub mod backend;
pub mod codec;
pub mod config;
pub mod dn;
pub mod entry;
pub mod enumerator;
pub mod error;
pub mod fileio;
pub mod hooks;
pub mod lock;
pub mod ops;
pub mod tool;

pub use backend::Backend;
pub use dn::Dn;
pub use entry::Entry;
pub use enumerator::Scope;
pub use error::{Error, Result};
