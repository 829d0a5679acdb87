//! Per-query memory accounting (spec.md §5 "Memory accounting").
//!
//! A real allocator-hook implementation would intercept `alloc`/`dealloc`
//! globally; that's out of scope for a library crate embedded in someone
//! else's process. Instead, `MemoryTracker` is an explicit ledger that
//! matrix/operator code charges and releases against as it allocates and
//! frees matrices and record buffers — approximate in exactly the way the
//! spec allows ("may under-count when the underlying allocator rounds up").

use graph_model::{GraphError, GraphResult};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct MemoryTracker {
    cap: u64,
    used: AtomicU64,
}

impl MemoryTracker {
    /// `cap == 0` means unlimited, matching the `query_mem_cap` convention.
    pub fn new(cap: u64) -> Self {
        Self {
            cap,
            used: AtomicU64::new(0),
        }
    }

    pub fn used(&self) -> u64 {
        self.used.load(Ordering::Relaxed)
    }

    pub fn cap(&self) -> u64 {
        self.cap
    }

    /// Charge `bytes` against the cap, failing without mutating the ledger
    /// if the charge would exceed it.
    pub fn charge(&self, bytes: u64) -> GraphResult<()> {
        if self.cap == 0 {
            self.used.fetch_add(bytes, Ordering::Relaxed);
            return Ok(());
        }
        loop {
            let current = self.used.load(Ordering::Relaxed);
            let next = current + bytes;
            if next > self.cap {
                tracing::warn!(used = current, requested = bytes, cap = self.cap, "query memory cap exceeded");
                return Err(GraphError::MemoryCap {
                    used: current,
                    cap: self.cap,
                });
            }
            if self
                .used
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(());
            }
        }
    }

    pub fn release(&self, bytes: u64) {
        self.used.fetch_sub(bytes.min(self.used.load(Ordering::Relaxed)), Ordering::Relaxed);
    }
}
