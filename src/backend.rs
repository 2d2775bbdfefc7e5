//! Ties configuration, the concurrency gate, and the pluggable hooks
//! together into the single entry point the operation layer is built on.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::Config;
use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::Result;
use crate::hooks::{
    EntryCodec, LineCodec, MinimalSchemaValidator, PasswordVerifier, PlainPasswordVerifier,
    ReferralPolicy, SchemaValidator, SimpleReferralPolicy,
};
use crate::lock::Gate;
use crate::tool::CursorState;

/// A filesystem-backed directory namespace rooted at one suffix DN.
pub struct Backend {
    pub(crate) base_dir: PathBuf,
    pub(crate) suffix: Dn,
    pub(crate) gate: Gate,
    pub(crate) codec: Arc<dyn EntryCodec>,
    pub(crate) schema: Arc<dyn SchemaValidator>,
    pub(crate) passwords: Arc<dyn PasswordVerifier>,
    pub(crate) referrals: Arc<dyn ReferralPolicy>,
    /// Ambient single-cursor tool-mode slot, mirroring the original
    /// backend's one-cursor-per-instance `entry_open`/`entry_next` surface
    /// for callers that prefer that over owning a [`crate::tool::ToolCursor`]
    /// themselves. Independent of `gate`: tool mode is for offline use.
    tool_cursor: Mutex<Option<CursorState>>,
}

impl Backend {
    /// Open a backend rooted at `suffix`, using `config`'s `directory` as
    /// the filesystem base and the default hook implementations.
    ///
    /// Fails only if `config` itself is invalid; the base directory is not
    /// required to exist yet (the suffix entry's `add` call creates it).
    pub fn open(config: Config, suffix: Dn) -> Result<Self> {
        info!(directory = %config.directory.display(), suffix = %suffix, "opening backend");
        Ok(Backend {
            base_dir: config.directory,
            suffix,
            gate: Gate::new(),
            codec: Arc::new(LineCodec),
            schema: Arc::new(MinimalSchemaValidator),
            passwords: Arc::new(PlainPasswordVerifier),
            referrals: Arc::new(SimpleReferralPolicy::default()),
            tool_cursor: Mutex::new(None),
        })
    }

    /// Replace the entry codec hook.
    pub fn with_codec(mut self, codec: Arc<dyn EntryCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the schema validator hook.
    pub fn with_schema(mut self, schema: Arc<dyn SchemaValidator>) -> Self {
        self.schema = schema;
        self
    }

    /// Replace the password verifier hook.
    pub fn with_passwords(mut self, passwords: Arc<dyn PasswordVerifier>) -> Self {
        self.passwords = passwords;
        self
    }

    /// Replace the referral policy hook.
    pub fn with_referrals(mut self, referrals: Arc<dyn ReferralPolicy>) -> Self {
        self.referrals = referrals;
        self
    }

    /// The backend's configured suffix DN.
    pub fn suffix(&self) -> &Dn {
        &self.suffix
    }

    /// The filesystem directory entry files and subtree directories live
    /// under.
    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    /// The entry codec hook currently in effect.
    pub fn codec(&self) -> &dyn EntryCodec {
        self.codec.as_ref()
    }

    /// Reset this backend's ambient tool cursor to just-opened, discarding
    /// any previous walk. Mirrors the tool surface's `entry_open`.
    pub fn entry_open(&self) {
        *self.tool_cursor.lock().unwrap_or_else(|e| e.into_inner()) = Some(CursorState::new());
    }

    /// Run the buffered `SUBTREE` walk into the ambient cursor and return
    /// id `1`, as [`crate::tool::ToolCursor::first`] does. Panics if
    /// [`Backend::entry_open`] was not called first.
    pub fn entry_first(&self) -> Result<Option<usize>> {
        let mut guard = self.tool_cursor.lock().unwrap_or_else(|e| e.into_inner());
        let state = guard.as_mut().expect("entry_first called before entry_open");
        state.first(self)
    }

    /// Advance the ambient cursor, as [`crate::tool::ToolCursor::next`] does.
    pub fn entry_next(&self) -> Option<usize> {
        let mut guard = self.tool_cursor.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_mut().expect("entry_next called before entry_open").next()
    }

    /// Take ownership of the entry at `id` out of the ambient cursor, as
    /// [`crate::tool::ToolCursor::get`] does.
    pub fn entry_get(&self, id: usize) -> Option<Entry> {
        let mut guard = self.tool_cursor.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_mut()?.get(id)
    }

    /// Close the ambient tool cursor, freeing its buffered entries.
    pub fn entry_close(&self) {
        *self.tool_cursor.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_does_not_require_directory_to_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("not-yet-created");
        let config = Config::from_directory(missing.clone()).unwrap();
        let backend = Backend::open(config, Dn::parse("dc=example,dc=com")).unwrap();
        assert_eq!(backend.base_dir(), missing.as_path());
    }

    #[test]
    fn ambient_tool_cursor_walks_suffix_entry() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_directory(dir.path().to_path_buf()).unwrap();
        let suffix = Dn::parse("dc=example,dc=com");
        let backend = Backend::open(config, suffix.clone()).unwrap();

        let mut entry = Entry::new("dc=example,dc=com".into(), suffix.clone());
        entry.add_value("objectClass", "domain".into());
        entry.add_value("dc", "example".into());
        crate::ops::add(&backend, entry).unwrap();

        backend.entry_open();
        let first_id = backend.entry_first().unwrap();
        assert_eq!(first_id, Some(1));
        assert_eq!(backend.entry_next(), None);
        let fetched = backend.entry_get(1).unwrap();
        assert_eq!(fetched.normalized_name, suffix);
        assert!(backend.entry_get(1).is_none());
        backend.entry_close();
    }

    #[test]
    #[should_panic(expected = "entry_first called before entry_open")]
    fn entry_first_without_open_panics() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_directory(dir.path().to_path_buf()).unwrap();
        let backend = Backend::open(config, Dn::parse("dc=example,dc=com")).unwrap();
        let _ = backend.entry_first();
    }
}
