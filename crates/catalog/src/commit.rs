//! The commit barrier (spec.md §5 "Shared resources": "The commit lock is
//! a single global mutex; writers acquire it only during their *commit*
//! phase, never during *ingest* or *drain*.").
//!
//! Grounded in `storage::InMemoryTransaction`'s buffer-then-commit shape:
//! a writing operator stages its mutations (ingest) without touching any
//! lock, then acquires [`CommitLock`] just long enough to publish them
//! (commit), then releases it before streaming results back out (drain).

use parking_lot::{Mutex, MutexGuard};

/// A single global mutex writers hold only while publishing staged
/// mutations. Readers never take it — matrix/catalog content for reads is
/// served from a pinned snapshot reference (`Arc::clone`), not through this
/// lock.
#[derive(Default)]
pub struct CommitLock {
    inner: Mutex<()>,
}

impl CommitLock {
    pub fn new() -> Self {
        Self { inner: Mutex::new(()) }
    }

    /// Acquire the commit lock for the duration of the closure. Callers
    /// must have already finished staging their mutations; this should be
    /// the smallest possible critical section.
    pub fn with_commit<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard: MutexGuard<'_, ()> = self.inner.lock();
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn commit_lock_serializes_critical_sections() {
        let lock = Arc::new(CommitLock::new());
        let counter = Arc::new(Mutex::new(0u64));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lock = lock.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    lock.with_commit(|| {
                        let mut c = counter.lock();
                        *c += 1;
                    });
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*counter.lock(), 8);
    }
}
