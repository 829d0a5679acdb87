//! `Record` — the row type that flows through the operator pipeline.
//!
//! Unlike `sparql::bindings::Binding` (a `BTreeMap<Variable, Node>` keyed by
//! name), slot indices here are assigned once at plan-build time and never
//! looked up by name at execution time — every operator only touches the
//! fixed set of indices in its `modifies` set (spec.md §3, §4.3).

use crate::value::SIValue;
use std::sync::Arc;

/// A record slot index, assigned during plan build.
pub type SlotIdx = usize;

/// One row flowing through the pipeline: an ordered, fixed-width array of
/// [`SIValue`] slots. Cloning a record is `Arc`-cheap for the shared tail
/// (property maps, paths) but the slot vector itself is duplicated, matching
/// the "records are cloned by the pipeline whenever a consumer fans out more
/// than once" rule from spec.md §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    slots: Vec<SIValue>,
}

impl Record {
    /// Allocate a record with `width` slots, all `Null`.
    pub fn with_width(width: usize) -> Self {
        Self {
            slots: vec![SIValue::Null; width],
        }
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, idx: SlotIdx) -> &SIValue {
        &self.slots[idx]
    }

    pub fn set(&mut self, idx: SlotIdx, value: SIValue) {
        self.slots[idx] = value;
    }

    pub fn as_slice(&self) -> &[SIValue] {
        &self.slots
    }

    /// Grow the record to accommodate a wider downstream plan, used when an
    /// operator's child was built against a narrower record shape (e.g. a
    /// `Merge`'s match vs. create branches).
    pub fn ensure_width(&mut self, width: usize) {
        if self.slots.len() < width {
            self.slots.resize(width, SIValue::Null);
        }
    }
}

impl std::ops::Index<SlotIdx> for Record {
    type Output = SIValue;
    fn index(&self, idx: SlotIdx) -> &SIValue {
        &self.slots[idx]
    }
}

/// A shared, immutable view of a record used as a hash-join / group-by key,
/// cheaply cloneable (`Arc`) the way `Aggregate`'s rax buckets need.
pub type RecordKey = Arc<[SIValue]>;

pub fn record_key(record: &Record, slots: &[SlotIdx]) -> RecordKey {
    slots.iter().map(|&i| record.get(i).clone()).collect::<Vec<_>>().into()
}
