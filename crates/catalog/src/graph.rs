//! The relationship/label catalog (spec.md §3 "Relationship/label catalog"):
//! `{label_name → label_id → diagonal selector matrix}` and
//! `{reltype_name → rel_id → adjacency matrix}`, plus the node/edge property
//! store and the bulk create/delete/update surface spec.md §6 requires of
//! the storage layer (`get_node`, `delete_nodes`, `delete_edges`,
//! `create_node`, `create_edge`).
//!
//! Grounded in `storage::InMemoryBackend`'s `DashMap`-backed entity map and
//! `storage::InMemoryTransaction`'s buffer-then-commit shape, generalized
//! from opaque byte blobs to typed nodes/edges and from a single KV map to
//! a node/edge store plus the derived label/adjacency matrices the matrix
//! engine needs. Matrices are cached and invalidated wholesale on any
//! commit rather than patched incrementally — correct and simple; the
//! per-relation/per-label patch is a candidate optimization, not a
//! correctness requirement (cf. spec.md §9 "Pending-tuples / zombie
//! compaction": eager-apply is an acceptable substitute for deferred
//! compaction).

use crate::commit::CommitLock;
use crate::memory::MemoryTracker;
use dashmap::DashMap;
use graph_model::{GraphError, GraphResult, LabelId, NameTable, NodeId, PropertyKeyId, RelTypeId};
use matrix::{build, Matrix};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A stored node: its label set and property map.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub id: NodeId,
    pub labels: SmallVec<[LabelId; 4]>,
    pub properties: FxHashMap<PropertyKeyId, graph_model::SIValue>,
}

/// A stored edge: its relation type, endpoints, and property map.
#[derive(Debug, Clone)]
pub struct EdgeEntry {
    pub id: NodeId,
    pub rel_type: RelTypeId,
    pub src: NodeId,
    pub dest: NodeId,
    pub properties: FxHashMap<PropertyKeyId, graph_model::SIValue>,
}

/// Either endpoint of a property update (spec.md §4.3 "Update").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Node(NodeId),
    Edge(NodeId),
}

/// One staged property mutation (spec.md §4.3 "Update": "stage an
/// `(entity_ref, key_id, new_value | remove)` tuple").
#[derive(Debug, Clone)]
pub enum PropertyUpdate {
    Set {
        entity: EntityRef,
        key: PropertyKeyId,
        value: graph_model::SIValue,
    },
    Remove {
        entity: EntityRef,
        key: PropertyKeyId,
    },
}

/// A node staged for creation; `id` is pre-reserved so record slots and
/// edge endpoints can reference it before the commit actually happens
/// (spec.md §4.3 "Create").
#[derive(Debug, Clone)]
pub struct PendingNode {
    pub id: NodeId,
    pub labels: SmallVec<[LabelId; 4]>,
    pub properties: FxHashMap<PropertyKeyId, graph_model::SIValue>,
}

#[derive(Debug, Clone)]
pub struct PendingEdge {
    pub id: NodeId,
    pub rel_type: RelTypeId,
    pub src: NodeId,
    pub dest: NodeId,
    pub properties: FxHashMap<PropertyKeyId, graph_model::SIValue>,
}

/// Everything a writing operator has staged during its *ingest* phase,
/// applied atomically during *commit* (spec.md §4.3 "shared two-phase
/// state machine").
#[derive(Debug, Clone, Default)]
pub struct PendingMutations {
    pub node_creates: Vec<PendingNode>,
    pub edge_creates: Vec<PendingEdge>,
    pub node_deletes: Vec<NodeId>,
    pub edge_deletes: Vec<NodeId>,
    pub property_updates: Vec<PropertyUpdate>,
}

impl PendingMutations {
    pub fn is_empty(&self) -> bool {
        self.node_creates.is_empty()
            && self.edge_creates.is_empty()
            && self.node_deletes.is_empty()
            && self.edge_deletes.is_empty()
            && self.property_updates.is_empty()
    }
}

/// Result-set statistics a commit reports back to the caller (spec.md §8
/// scenario 6: "the returned count matches the number of nodes deleted as
/// reported by result-set statistics").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub nodes_deleted: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
}

/// The committed graph: node/edge store plus the derived label-selector and
/// adjacency matrices every algebraic expression is built over.
pub struct Graph {
    labels: NameTable<LabelId>,
    reltypes: NameTable<RelTypeId>,
    properties: NameTable<PropertyKeyId>,

    nodes: DashMap<NodeId, NodeEntry>,
    edges: DashMap<NodeId, EdgeEntry>,

    label_matrices: RwLock<FxHashMap<LabelId, Arc<Matrix<bool>>>>,
    adjacency: RwLock<FxHashMap<RelTypeId, Arc<Matrix<bool>>>>,

    next_node_id: AtomicU64,
    next_edge_id: AtomicU64,

    commit_lock: CommitLock,
    mem: MemoryTracker,

    edge_bulk_delete_threshold: usize,
}

impl Graph {
    pub fn new(mem_cap: u64, edge_bulk_delete_threshold: usize) -> Self {
        Self {
            labels: NameTable::new(),
            reltypes: NameTable::new(),
            properties: NameTable::new(),
            nodes: DashMap::new(),
            edges: DashMap::new(),
            label_matrices: RwLock::new(FxHashMap::default()),
            adjacency: RwLock::new(FxHashMap::default()),
            next_node_id: AtomicU64::new(0),
            next_edge_id: AtomicU64::new(0),
            commit_lock: CommitLock::new(),
            mem: MemoryTracker::new(mem_cap),
            edge_bulk_delete_threshold,
        }
    }

    pub fn labels(&self) -> &NameTable<LabelId> {
        &self.labels
    }

    pub fn reltypes(&self) -> &NameTable<RelTypeId> {
        &self.reltypes
    }

    pub fn properties(&self) -> &NameTable<PropertyKeyId> {
        &self.properties
    }

    pub fn memory(&self) -> &MemoryTracker {
        &self.mem
    }

    pub fn commit_lock(&self) -> &CommitLock {
        &self.commit_lock
    }

    /// Reserve a fresh node id without making the node visible to readers
    /// yet (spec.md §4.3 "Create": "instantiate a node with a
    /// freshly-reserved id").
    pub fn reserve_node_id(&self) -> NodeId {
        self.next_node_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn reserve_edge_id(&self) -> NodeId {
        self.next_edge_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Upper bound on live node ids (`0..node_capacity()`), the dimension
    /// every per-query frontier matrix is built against.
    pub fn node_capacity(&self) -> usize {
        self.next_node_id.load(Ordering::Relaxed) as usize
    }

    /// Snapshot read: the diagonal selector matrix for `label`, rebuilt
    /// (and cached) against the current node count if the cache was
    /// invalidated by an intervening commit.
    pub fn label_matrix(&self, label: LabelId) -> Arc<Matrix<bool>> {
        {
            let cache = self.label_matrices.read();
            if let Some(m) = cache.get(&label) {
                return m.clone();
            }
        }
        let n = self.node_capacity();
        let idx: Vec<usize> = self
            .nodes
            .iter()
            .filter(|e| e.labels.contains(&label))
            .map(|e| e.id as usize)
            .collect();
        let m = Arc::new(build(n, n, &idx, &idx, &vec![true; idx.len()], |a, b| *a || *b));
        self.label_matrices.write().insert(label, m.clone());
        m
    }

    /// Snapshot read: the adjacency matrix for `rel_type`. Column-compressed
    /// convention per spec.md GLOSSARY: `(i, j)` present iff an edge of this
    /// relation goes from node `j` to node `i`.
    pub fn adjacency_matrix(&self, rel_type: RelTypeId) -> Arc<Matrix<bool>> {
        {
            let cache = self.adjacency.read();
            if let Some(m) = cache.get(&rel_type) {
                return m.clone();
            }
        }
        let n = self.node_capacity();
        let (mut rows, mut cols) = (Vec::new(), Vec::new());
        for e in self.edges.iter() {
            if e.rel_type == rel_type {
                rows.push(e.dest as usize);
                cols.push(e.src as usize);
            }
        }
        let m = Arc::new(build(n, n, &rows, &cols, &vec![true; rows.len()], |a, b| *a || *b));
        self.adjacency.write().insert(rel_type, m.clone());
        m
    }

    /// Element-wise OR of several relation types' adjacency matrices, for
    /// multi-type relations `-[:R|:S]->` (spec.md §4.2).
    pub fn union_adjacency(&self, rel_types: &[RelTypeId]) -> Arc<Matrix<bool>> {
        let n = self.node_capacity();
        if rel_types.is_empty() {
            return Arc::new(Matrix::empty_sparse(n, n));
        }
        let mut acc = (*self.adjacency_matrix(rel_types[0])).clone();
        for &rt in &rel_types[1..] {
            let next = self.adjacency_matrix(rt);
            acc = matrix::method::ewise_add(&acc, &next, |a, b| *a || *b)
                .expect("adjacency matrices always share the same graph-wide dimension");
        }
        Arc::new(acc)
    }

    pub fn get_node(&self, id: NodeId) -> Option<NodeEntry> {
        self.nodes.get(&id).map(|e| e.clone())
    }

    pub fn get_edge(&self, id: NodeId) -> Option<EdgeEntry> {
        self.edges.get(&id).map(|e| e.clone())
    }

    /// Every live node id, for `AllNodeScan` (spec.md §4.3 "Traversal
    /// operators" implies a label-free scan exists alongside the
    /// label-scoped one; §6 lists `get_node` but every interpreted engine
    /// this one is modeled on also exposes an unfiltered node iterator).
    pub fn all_node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|e| e.id).collect()
    }

    /// Live node ids carrying `label`, for `NodeByLabelScan`.
    pub fn node_ids_with_label(&self, label: LabelId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|e| e.labels.contains(&label))
            .map(|e| e.id)
            .collect()
    }

    /// First live edge of one of `rel_types` from `src` to `dest`, used to
    /// reconstruct a concrete [`graph_model::EdgeRef`] when a traversal
    /// operator must report the edge it crossed (spec.md §3:
    /// "`relation_ids` ... used to assemble a concrete edge when records
    /// must report the traversed edge").
    pub fn find_edge(&self, src: NodeId, dest: NodeId, rel_types: &[RelTypeId]) -> Option<graph_model::EdgeRef> {
        self.edges.iter().find_map(|e| {
            if e.src == src && e.dest == dest && rel_types.contains(&e.rel_type) {
                Some(graph_model::EdgeRef {
                    id: e.id,
                    rel_type: e.rel_type,
                    src: e.src,
                    dest: e.dest,
                })
            } else {
                None
            }
        })
    }

    /// Live out-neighbors of `src` restricted to `rel_types` (empty slice
    /// means "any relation type"), for variable-length traversal's
    /// one-hop expansion step.
    pub fn out_neighbors(&self, src: NodeId, rel_types: &[RelTypeId]) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.src == src && (rel_types.is_empty() || rel_types.contains(&e.rel_type)))
            .map(|e| e.dest)
            .collect()
    }

    /// Live in-neighbors of `dest` restricted to `rel_types`, the mirror of
    /// [`Graph::out_neighbors`] used when a traversal leg is reversed
    /// (`<-[]-`).
    pub fn in_neighbors(&self, dest: NodeId, rel_types: &[RelTypeId]) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.dest == dest && (rel_types.is_empty() || rel_types.contains(&e.rel_type)))
            .map(|e| e.src)
            .collect()
    }

    /// `true` iff two live edges of `rel_type` share the same (src, dest)
    /// ordered pair — the single-relation-type adjacency matrix collapses
    /// such duplicates to one boolean entry, so a traversal that counts
    /// distinct paths rather than distinct destinations must not take a
    /// matrix-backed fast path when this holds.
    ///
    /// Grounded in `Graph_RelationshipContainsMultiEdge` (original source's
    /// `op_cond_var_len_traverse.c` `CondVarLenTraverseInit`), which gates
    /// the neighbors-only variable-length fast path on this exact check.
    pub fn relationship_contains_multi_edge(&self, rel_type: RelTypeId) -> bool {
        let mut seen = FxHashSet::default();
        for e in self.edges.iter() {
            if e.rel_type == rel_type && !seen.insert((e.src, e.dest)) {
                return true;
            }
        }
        false
    }

    /// Invalidate every cached matrix. Called once per commit rather than
    /// per affected label/reltype — simple and correct; a finer-grained
    /// invalidation is a possible follow-up, not required by spec.md.
    fn invalidate_caches(&self) {
        self.label_matrices.write().clear();
        self.adjacency.write().clear();
    }

    /// Apply a batch of staged mutations atomically under the commit lock
    /// (spec.md §5 "Shared resources": "writers acquire it only during
    /// their *commit* phase"; §7: "Write operators must either (a) complete
    /// all staged mutations atomically under the commit lock, or (b) not
    /// touch the graph at all").
    pub fn commit(&self, pending: PendingMutations) -> GraphResult<CommitStats> {
        if pending.is_empty() {
            return Ok(CommitStats::default());
        }
        let stats = self.commit_lock.with_commit(|| self.apply(pending));
        self.invalidate_caches();
        stats
    }

    fn apply(&self, pending: PendingMutations) -> GraphResult<CommitStats> {
        let mut stats = CommitStats::default();

        for n in pending.node_creates {
            stats.nodes_created += 1;
            self.nodes.insert(
                n.id,
                NodeEntry {
                    id: n.id,
                    labels: n.labels,
                    properties: n.properties,
                },
            );
        }

        for e in pending.edge_creates {
            if !self.nodes.contains_key(&e.src) || !self.nodes.contains_key(&e.dest) {
                return Err(GraphError::InternalPanic(
                    "edge endpoint missing at commit time".into(),
                ));
            }
            stats.relationships_created += 1;
            self.edges.insert(
                e.id,
                EdgeEntry {
                    id: e.id,
                    rel_type: e.rel_type,
                    src: e.src,
                    dest: e.dest,
                    properties: e.properties,
                },
            );
        }

        for upd in pending.property_updates {
            stats.properties_set += 1;
            match upd {
                PropertyUpdate::Set { entity, key, value } => match entity {
                    EntityRef::Node(id) => {
                        if let Some(mut n) = self.nodes.get_mut(&id) {
                            n.properties.insert(key, value);
                        }
                    }
                    EntityRef::Edge(id) => {
                        if let Some(mut e) = self.edges.get_mut(&id) {
                            e.properties.insert(key, value);
                        }
                    }
                },
                PropertyUpdate::Remove { entity, key } => match entity {
                    EntityRef::Node(id) => {
                        if let Some(mut n) = self.nodes.get_mut(&id) {
                            n.properties.remove(&key);
                        }
                    }
                    EntityRef::Edge(id) => {
                        if let Some(mut e) = self.edges.get_mut(&id) {
                            e.properties.remove(&key);
                        }
                    }
                },
            }
        }

        // Explicit edge deletes first, then node deletes cascade-remove any
        // remaining incident edges (spec.md §4.3 "Delete": "bulk deletion
        // which implicitly removes adjacent edges of deleted nodes").
        let explicit_edge_deletes = pending.edge_deletes.len();
        if explicit_edge_deletes <= self.edge_bulk_delete_threshold {
            for id in &pending.edge_deletes {
                if self.edges.remove(id).is_some() {
                    stats.relationships_deleted += 1;
                }
            }
        } else {
            let to_delete: rustc_hash::FxHashSet<NodeId> = pending.edge_deletes.iter().copied().collect();
            self.edges.retain(|id, _| {
                let keep = !to_delete.contains(id);
                if !keep {
                    stats.relationships_deleted += 1;
                }
                keep
            });
        }

        if !pending.node_deletes.is_empty() {
            let to_delete: rustc_hash::FxHashSet<NodeId> = pending.node_deletes.iter().copied().collect();
            for id in &pending.node_deletes {
                if self.nodes.remove(id).is_some() {
                    stats.nodes_deleted += 1;
                }
            }
            let mut implicit = 0u64;
            self.edges.retain(|_, e| {
                let keep = !to_delete.contains(&e.src) && !to_delete.contains(&e.dest);
                if !keep {
                    implicit += 1;
                }
                keep
            });
            stats.relationships_deleted += implicit;
        }

        Ok(stats)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(0, 1_000)
    }
}
