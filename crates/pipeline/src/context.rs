//! `QueryContext` — the per-query execution handle threaded through every
//! operator's `consume()` call: the pinned graph snapshot, the runtime
//! config, the per-thread matrix scratch space, and the result-set
//! statistics a write operator's commit phase accumulates.
//!
//! Grounded in `storage::InMemoryTransaction`'s "one handle per in-flight
//! operation, carrying both the backend reference and the staged buffer"
//! shape, generalized from a single KV transaction to the whole operator
//! DAG's shared runtime state.

use catalog::{CommitStats, Graph, RuntimeConfig};
use matrix::Sauna;
use std::sync::Arc;

/// Everything the operator pipeline needs that isn't private to one
/// operator: the graph snapshot every read operator resolves matrices
/// against, the validated runtime knobs, the Gustavson scratch space
/// reused across every `mxm` call on this thread (allocated once per
/// thread, reused across operators), and the running result-set counters
/// write operators add to at commit time.
pub struct QueryContext {
    pub graph: Arc<Graph>,
    pub config: RuntimeConfig,
    sauna: Sauna<bool>,
    stats: CommitStats,
}

impl QueryContext {
    pub fn new(graph: Arc<Graph>, config: RuntimeConfig) -> Self {
        let capacity = graph.node_capacity().max(1);
        Self {
            graph,
            config,
            sauna: Sauna::new(capacity),
            stats: CommitStats::default(),
        }
    }

    /// The per-thread Gustavson scratch space, grown monotonically as the
    /// graph's node count grows across the lifetime of one query.
    pub fn sauna(&mut self) -> &mut Sauna<bool> {
        let capacity = self.graph.node_capacity().max(1);
        self.sauna.resize(capacity);
        &mut self.sauna
    }

    pub fn record_commit(&mut self, stats: CommitStats) {
        self.stats.nodes_created += stats.nodes_created;
        self.stats.relationships_created += stats.relationships_created;
        self.stats.nodes_deleted += stats.nodes_deleted;
        self.stats.relationships_deleted += stats.relationships_deleted;
        self.stats.properties_set += stats.properties_set;
    }

    pub fn stats(&self) -> CommitStats {
        self.stats
    }
}
