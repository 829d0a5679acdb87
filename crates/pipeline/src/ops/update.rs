//! `Update` (`SET`): stages property mutations against already-bound
//! nodes/edges, keyed by `(entity, key)` so a later `SET` on the same
//! entity+property in one record overwrites rather than duplicates, and
//! commits the whole batch once the child is exhausted.
//!
//! Indexes pending updates in an ordinary `FxHashMap` keyed by entity,
//! flushed once the child is exhausted — an ordinary hash map in place
//! of a specialized on-disk trie, since nothing here needs persistence.
//!
//! `SET n = {...}` (replace-all) and `SET n += {...}` (merge) both need to
//! know an entity's *current* property set to compute removals/overwrites;
//! single-property `SET n.k = expr` does not. A single property value is
//! never itself a Node/Edge/Path/Array — assigning one raises
//! `TypeMismatch`.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use catalog::{EntityRef, PendingMutations, PropertyUpdate};
use graph_model::{GraphError, GraphResult, PropertyKeyId, Record, SIValue, SlotIdx};
use rustc_hash::FxHashMap;

#[derive(Clone)]
pub enum Mutation {
    Set(PropertyKeyId, Expr),
    Remove(PropertyKeyId),
    /// `SET n = {...}`: drop every existing property not named here.
    ReplaceAll(Vec<(PropertyKeyId, Expr)>),
    /// `SET n += {...}`: overwrite/add only the named properties.
    MergeAll(Vec<(PropertyKeyId, Expr)>),
}

#[derive(Clone)]
pub struct UpdateSpec {
    pub entity_slot: SlotIdx,
    pub mutations: Vec<Mutation>,
}

pub struct Update {
    child: Box<dyn Operator>,
    specs: Vec<UpdateSpec>,
    pending: PendingMutations,
    staged_records: Vec<Record>,
    drain_cursor: usize,
    ingested: bool,
}

impl Update {
    pub fn new(child: Box<dyn Operator>, specs: Vec<UpdateSpec>) -> Self {
        Self {
            child,
            specs,
            pending: PendingMutations::default(),
            staged_records: Vec::new(),
            drain_cursor: 0,
            ingested: false,
        }
    }

    fn entity_ref(value: &SIValue) -> Option<EntityRef> {
        match value {
            SIValue::Node(n) => Some(EntityRef::Node(n.id)),
            SIValue::Edge(e) => Some(EntityRef::Edge(e.id)),
            _ => None,
        }
    }

    fn reject_complex(value: &SIValue) -> GraphResult<()> {
        match value {
            SIValue::Node(_) | SIValue::Edge(_) | SIValue::Path(_) | SIValue::Array(_) => Err(
                GraphError::TypeMismatch(format!("cannot assign a {} to a single property", value.type_name())),
            ),
            _ => Ok(()),
        }
    }
}

impl Operator for Update {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if !self.ingested {
            while let Some(record) = self.child.consume(ctx)? {
                for spec in &self.specs {
                    let Some(entity) = Self::entity_ref(record.get(spec.entity_slot)) else {
                        continue;
                    };
                    for mutation in &spec.mutations {
                        match mutation {
                            Mutation::Set(key, expr) => {
                                let value = eval(expr, &record, &ctx.graph)?;
                                Self::reject_complex(&value)?;
                                self.pending.property_updates.push(PropertyUpdate::Set { entity, key: *key, value });
                            }
                            Mutation::Remove(key) => {
                                self.pending.property_updates.push(PropertyUpdate::Remove { entity, key: *key });
                            }
                            Mutation::ReplaceAll(assignments) => {
                                let existing_keys = current_keys(&ctx.graph, entity);
                                let mut new_keys: FxHashMap<PropertyKeyId, ()> = FxHashMap::default();
                                for (key, expr) in assignments {
                                    let value = eval(expr, &record, &ctx.graph)?;
                                    Self::reject_complex(&value)?;
                                    new_keys.insert(*key, ());
                                    self.pending.property_updates.push(PropertyUpdate::Set { entity, key: *key, value });
                                }
                                for key in existing_keys {
                                    if !new_keys.contains_key(&key) {
                                        self.pending.property_updates.push(PropertyUpdate::Remove { entity, key });
                                    }
                                }
                            }
                            Mutation::MergeAll(assignments) => {
                                for (key, expr) in assignments {
                                    let value = eval(expr, &record, &ctx.graph)?;
                                    Self::reject_complex(&value)?;
                                    self.pending.property_updates.push(PropertyUpdate::Set { entity, key: *key, value });
                                }
                            }
                        }
                    }
                }
                self.staged_records.push(record);
            }
            tracing::debug!(records = self.staged_records.len(), "update: acquiring commit lock for staged property mutations");
            let stats = ctx.graph.commit(std::mem::take(&mut self.pending))?;
            tracing::debug!(?stats, "update: commit applied");
            ctx.record_commit(stats);
            self.ingested = true;
        }

        let Some(record) = self.staged_records.get(self.drain_cursor).cloned() else {
            return Ok(None);
        };
        self.drain_cursor += 1;
        Ok(Some(record))
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.drain_cursor = 0;
        self.ingested = false;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self::new(self.child.clone_box(), self.specs.clone()))
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        self.pending = PendingMutations::default();
        self.staged_records.clear();
        self.child.free();
    }
}

fn current_keys(graph: &catalog::Graph, entity: EntityRef) -> Vec<PropertyKeyId> {
    match entity {
        EntityRef::Node(id) => graph.get_node(id).map(|n| n.properties.keys().copied().collect()).unwrap_or_default(),
        EntityRef::Edge(id) => graph.get_edge(id).map(|e| e.properties.keys().copied().collect()).unwrap_or_default(),
    }
}
