//! Stream search results from the tree enumerator under the shared lock.

use tracing::instrument;

use crate::backend::Backend;
use crate::dn::Dn;
use crate::entry::Entry;
use crate::enumerator::{self, ReferralContext, Scope, Sink};
use crate::error::Result;

/// Search `base` with `scope`, delivering every entry for which `filter`
/// returns `true` to `sink`. Referrals encountered below `base` are routed
/// through [`Sink::accept_referral`] rather than [`Sink::accept`] unless
/// `manage_dsa_it` is set. Acquires the shared side of the backend's gate
/// for the whole walk.
#[instrument(skip(backend, filter, sink), fields(base = %base, scope = ?scope))]
pub fn search(
    backend: &Backend,
    base: &Dn,
    scope: Scope,
    manage_dsa_it: bool,
    filter: &dyn Fn(&Entry) -> bool,
    sink: &mut dyn Sink,
) -> Result<()> {
    let _guard = backend.gate.read();
    let mut filtered = FilterSink { filter, inner: sink };
    let referrals = ReferralContext {
        policy: backend.referrals.as_ref(),
        manage_dsa_it,
    };
    enumerator::enumerate(
        &backend.base_dir,
        &backend.suffix,
        base,
        scope,
        backend.codec.as_ref(),
        Some(referrals),
        &mut filtered,
    )
}

struct FilterSink<'a> {
    filter: &'a dyn Fn(&Entry) -> bool,
    inner: &'a mut dyn Sink,
}

impl Sink for FilterSink<'_> {
    fn accept(&mut self, entry: Entry) -> Result<()> {
        if (self.filter)(&entry) {
            self.inner.accept(entry)
        } else {
            Ok(())
        }
    }

    fn accept_referral(&mut self, entry: Entry, uris: Vec<String>) -> Result<()> {
        if (self.filter)(&entry) {
            self.inner.accept_referral(entry, uris)
        } else {
            Ok(())
        }
    }
}
