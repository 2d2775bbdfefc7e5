//! The per-backend concurrency gate: one reader/writer lock guarding every
//! filesystem mutation, plus a second mutex serializing access to the
//! non-reentrant [`crate::hooks::EntryCodec`] hook.
//!
//! Both are plain `std::sync` primitives: every operation in this crate is a
//! blocking call on the caller's own thread, so there is no async runtime
//! anywhere below this layer.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Guards filesystem access for one backend instance.
#[derive(Debug, Default)]
pub struct Gate {
    fs: RwLock<()>,
    codec: Mutex<()>,
}

impl Gate {
    /// Build a new, unheld gate.
    pub fn new() -> Self {
        Gate::default()
    }

    /// Acquire the shared side: `bind`, `search`, `referral_probe`, and
    /// tool-read operations.
    pub fn read(&self) -> ReadGuard<'_> {
        ReadGuard(self.fs.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Acquire the exclusive side: `add`, `modify`, `delete`, `rename`.
    pub fn write(&self) -> WriteGuard<'_> {
        WriteGuard(self.fs.write().unwrap_or_else(|e| e.into_inner()))
    }

    /// Serialize one call into the entry codec. Orthogonal to the
    /// reader/writer lock above: callers take the `fs` side first, then
    /// this mutex only around the short encode/decode step.
    pub fn codec(&self) -> CodecGuard<'_> {
        CodecGuard(self.codec.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Held while an operation performs shared (read-only) filesystem access.
pub struct ReadGuard<'a>(RwLockReadGuard<'a, ()>);

/// Held while an operation performs exclusive (mutating) filesystem access.
pub struct WriteGuard<'a>(RwLockWriteGuard<'a, ()>);

/// Held around a single [`crate::hooks::EntryCodec`] call.
pub struct CodecGuard<'a>(MutexGuard<'a, ()>);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_reads_do_not_block_each_other() {
        let gate = Arc::new(Gate::new());
        let g1 = gate.read();
        let g2 = gate.read();
        drop(g1);
        drop(g2);
    }

    #[test]
    fn write_excludes_other_writers() {
        let gate = Arc::new(Gate::new());
        let gate2 = Arc::clone(&gate);
        let guard = gate.write();
        let handle = thread::spawn(move || {
            let _g = gate2.write();
        });
        drop(guard);
        handle.join().unwrap();
    }
}
