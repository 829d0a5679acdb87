//! Stable small-integer identifiers for labels, relationship types, and
//! property keys, plus a bidirectional name table.
//!
//! The sparse matrices in `matrix` and `catalog` are indexed by these ids,
//! not by name, so every label/reltype lookup on the hot path is an array
//! index rather than a hash lookup.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Index of a node within the graph's global node-id space.
pub type NodeId = u64;

macro_rules! small_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

small_id!(LabelId);
small_id!(RelTypeId);
small_id!(PropertyKeyId);

/// Bidirectional name <-> id table, shared (via `Arc`) between the catalog,
/// the algebra builder, and the pipeline operators so that all three agree
/// on the same id assignment for a given name.
///
/// Modeled on `rdf-model::Dictionary`'s intern-or-reuse discipline, but
/// assigns dense sequential ids (like `datalog::SparseMatrix`'s
/// `node_to_id`/`id_to_node` pair) instead of returning string references,
/// since ids here double as matrix indices.
#[derive(Clone)]
pub struct NameTable<Id> {
    inner: Arc<RwLock<NameTableInner>>,
    _marker: std::marker::PhantomData<Id>,
}

struct NameTableInner {
    name_to_id: FxHashMap<String, u32>,
    id_to_name: Vec<String>,
}

impl<Id: From<u32> + Into<u32> + Copy> NameTable<Id> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(NameTableInner {
                name_to_id: FxHashMap::default(),
                id_to_name: Vec::new(),
            })),
            _marker: std::marker::PhantomData,
        }
    }

    /// Resolve a name to its id, assigning a fresh one if unseen.
    pub fn intern(&self, name: &str) -> Id {
        {
            let guard = self.inner.read();
            if let Some(&id) = guard.name_to_id.get(name) {
                return Id::from(id);
            }
        }

        let mut guard = self.inner.write();
        if let Some(&id) = guard.name_to_id.get(name) {
            return Id::from(id);
        }
        let id = guard.id_to_name.len() as u32;
        guard.id_to_name.push(name.to_string());
        guard.name_to_id.insert(name.to_string(), id);
        Id::from(id)
    }

    /// Look up an id without assigning one.
    pub fn get(&self, name: &str) -> Option<Id> {
        self.inner.read().name_to_id.get(name).copied().map(Id::from)
    }

    pub fn name(&self, id: Id) -> Option<String> {
        let id: u32 = id.into();
        self.inner.read().id_to_name.get(id as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<Id: From<u32> + Into<u32> + Copy> Default for NameTable<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u32> for LabelId {
    fn from(v: u32) -> Self {
        LabelId(v)
    }
}
impl From<LabelId> for u32 {
    fn from(v: LabelId) -> Self {
        v.0
    }
}
impl From<u32> for RelTypeId {
    fn from(v: u32) -> Self {
        RelTypeId(v)
    }
}
impl From<RelTypeId> for u32 {
    fn from(v: RelTypeId) -> Self {
        v.0
    }
}
impl From<u32> for PropertyKeyId {
    fn from(v: u32) -> Self {
        PropertyKeyId(v)
    }
}
impl From<PropertyKeyId> for u32 {
    fn from(v: PropertyKeyId) -> Self {
        v.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_same_name_returns_same_id() {
        let t: NameTable<LabelId> = NameTable::new();
        let a = t.intern("Person");
        let b = t.intern("Person");
        assert_eq!(a, b);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn intern_distinct_names_are_dense() {
        let t: NameTable<RelTypeId> = NameTable::new();
        let r1 = t.intern("KNOWS");
        let r2 = t.intern("LIKES");
        assert_eq!(r1.0, 0);
        assert_eq!(r2.0, 1);
        assert_eq!(t.name(r1).as_deref(), Some("KNOWS"));
    }

    #[test]
    fn get_without_intern_does_not_assign() {
        let t: NameTable<PropertyKeyId> = NameTable::new();
        assert!(t.get("age").is_none());
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn clone_shares_storage() {
        let t1: NameTable<LabelId> = NameTable::new();
        let id = t1.intern("A");
        let t2 = t1.clone();
        assert_eq!(t2.get("A"), Some(id));
    }
}
