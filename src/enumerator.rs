//! Recursive subtree walk over the on-disk entry-file hierarchy.
//!
//! Mirrors the shape of a classic LDIF-backend tree walk: read the base
//! entry (unless the base DN is the namespace root, which has no file of
//! its own), deliver it if the scope wants the base, then list and
//! numerically/lexicographically sort the base's subtree directory and
//! recurse into each child with a narrowed scope.

use std::fs;
use std::path::Path;

use crate::codec;
use crate::dn::Dn;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::hooks::{EntryCodec, ReferralPolicy};

/// The four subsets of a subtree a search may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The base entry itself, nothing else.
    Base,
    /// Direct children of the base only.
    OneLevel,
    /// The base plus all descendants.
    Subtree,
    /// All strict descendants, excluding the base itself.
    Subordinate,
}

/// Receives entries as the enumerator walks the tree.
///
/// Returning `Err` from [`Sink::accept`] aborts the walk early and
/// propagates the error to the caller of [`enumerate`].
pub trait Sink {
    /// Called once per matching entry, in directory-sorted order.
    fn accept(&mut self, entry: Entry) -> Result<()>;

    /// Called instead of [`Sink::accept`] when `entry` is a referral
    /// encountered strictly below the requested base (not the base itself)
    /// and the caller has not requested "manage DSA IT".
    ///
    /// The default aborts the walk with [`Error::Referral`], matching the
    /// behavior of a client that is expected to chase the redirect rather
    /// than receive the referral entry's raw attributes. Override to
    /// collect referrals and continue instead.
    fn accept_referral(&mut self, _entry: Entry, uris: Vec<String>) -> Result<()> {
        Err(Error::Referral(uris))
    }
}

/// A [`Sink`] that buffers every entry it receives, for the tool cursor's
/// batch-enumeration mode.
#[derive(Debug, Default)]
pub struct BufferSink {
    /// Entries collected so far, in walk order.
    pub entries: Vec<Entry>,
}

impl Sink for BufferSink {
    fn accept(&mut self, entry: Entry) -> Result<()> {
        self.entries.push(entry);
        Ok(())
    }
}

/// Referral handling inputs: the policy to consult and whether the caller
/// requested "manage DSA IT" (which suppresses referral redirection).
#[derive(Clone, Copy)]
pub struct ReferralContext<'a> {
    pub policy: &'a dyn ReferralPolicy,
    pub manage_dsa_it: bool,
}

/// Walk the subtree rooted at `base_dn` (interpreted under `suffix` and
/// `base_dir`, as in [`codec::encode`]), delivering matches to `sink`.
///
/// `referrals` is `None` for callers that want every entry delivered
/// verbatim regardless of its referral status (the tool interface's bulk
/// export); callers that serve live search requests pass `Some` so entries
/// encountered strictly below `base_dn` that are referrals get routed
/// through [`Sink::accept_referral`] instead of [`Sink::accept`].
pub fn enumerate(
    base_dir: &Path,
    suffix: &Dn,
    base_dn: &Dn,
    scope: Scope,
    codec: &dyn EntryCodec,
    referrals: Option<ReferralContext<'_>>,
    sink: &mut dyn Sink,
) -> Result<()> {
    let path = codec::encode(base_dir, suffix, base_dn);
    let skip_base_file = base_dn.is_root();
    descend(
        &path,
        skip_base_file,
        base_dn.parent(),
        scope,
        true,
        codec,
        referrals,
        sink,
    )
}

#[allow(clippy::too_many_arguments)]
fn descend(
    path: &Path,
    skip_base_file: bool,
    parent_dn: Dn,
    scope: Scope,
    is_base: bool,
    codec: &dyn EntryCodec,
    referrals: Option<ReferralContext<'_>>,
    sink: &mut dyn Sink,
) -> Result<()> {
    let mut effective_parent = parent_dn;

    if !skip_base_file {
        let bytes = crate::fileio::read_file(path)
            .map_err(|e| Error::from_read(path, e))?
            .ok_or(Error::NoSuchObject)?;
        let mut entry = codec.decode(&bytes)?;
        entry.graft_parent(&effective_parent);
        let full_dn = entry.normalized_name.clone();

        if matches!(scope, Scope::Base | Scope::Subtree) {
            let as_referral = !is_base
                && referrals.is_some_and(|ctx| !ctx.manage_dsa_it && ctx.policy.is_referral(&entry));
            if as_referral {
                let uris = referrals.unwrap().policy.referrals_of(&entry);
                sink.accept_referral(entry, uris)?;
            } else {
                sink.accept(entry)?;
            }
        }
        effective_parent = full_dn;
    }

    if scope == Scope::Base {
        return Ok(());
    }

    let dir = codec::parent_dir(path);
    let read_dir = match fs::read_dir(&dir) {
        Ok(rd) => rd,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        // Preserves the original backend's behavior: an unexpected opendir
        // failure (permissions, EMFILE, ...) surfaces as busy rather than a
        // generic I/O error.
        Err(_) => return Err(Error::Busy),
    };

    let mut names: Vec<String> = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|_| Error::Busy)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(codec::LDIF_SUFFIX) {
            names.push(name);
        }
    }
    names.sort_by(|a, b| codec::compare_segments(a, b));

    let child_scope = match scope {
        Scope::OneLevel => Scope::Base,
        Scope::Subordinate => Scope::Subtree,
        other => other,
    };

    for name in names {
        let child_path = dir.join(&name);
        descend(
            &child_path,
            false,
            effective_parent.clone(),
            child_scope,
            false,
            codec,
            referrals,
            sink,
        )?;
    }

    Ok(())
}
