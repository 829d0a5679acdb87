//! Label/reltype catalog, node/property store, commit barrier, and
//! per-query memory accounting.
//!
//! Plays the role `storage` plays in the teacher workspace: the layer
//! `algebra` and `pipeline` sit on top of, owning the actual graph data and
//! the matrices derived from it, plus the concurrency primitives (a single
//! commit mutex, an atomic memory ledger) that make concurrent queries safe.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod commit;
pub mod config;
pub mod graph;
pub mod memory;

pub use commit::CommitLock;
pub use config::{RuntimeConfig, RuntimeConfigBuilder};
pub use graph::{CommitStats, EdgeEntry, EntityRef, Graph, NodeEntry, PendingEdge, PendingMutations, PendingNode, PropertyUpdate};
pub use memory::MemoryTracker;

impl Graph {
    /// Construct a [`Graph`] sized and thresholded by a validated
    /// [`RuntimeConfig`] rather than bare numbers.
    pub fn with_config(config: &RuntimeConfig) -> Self {
        Self::new(config.query_mem_cap(), config.edge_bulk_delete_threshold())
    }
}
