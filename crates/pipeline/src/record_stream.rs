//! The operator contract (spec.md §4.3): `init()`, `consume()`, `reset()`,
//! `clone(plan)`, `free()`, plus a static `modifies` set. Operators are
//! pulled, one record at a time, by their parent; the DAG root is driven by
//! [`run`].
//!
//! Grounded in `wcoj::LeapfrogIterator`'s `&mut self -> Option<T>` pull
//! shape (`next()`/`seek()` advance internal state and hand back a value or
//! `None`), generalized from one join iterator to a tree of heterogeneous
//! operator kinds behind `Box<dyn Operator>`.

use crate::context::QueryContext;
use graph_model::{GraphResult, Record, SlotIdx};

/// One node of the execution plan DAG.
///
/// Per spec.md §4.3 "All operators are single-threaded with respect to any
/// one query" — `Operator` is not `Send`/`Sync`; a query's whole DAG lives
/// and runs on one worker thread. Parallelism happens only inside the
/// matrix kernels `QueryContext::sauna` feeds.
pub trait Operator {
    /// One-time setup, called exactly once before the first `consume()`.
    fn init(&mut self, _ctx: &mut QueryContext) -> GraphResult<()> {
        Ok(())
    }

    /// Pull the next record, or `None` once this operator is exhausted.
    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>>;

    /// Re-run from the beginning (used by the right-hand child of a nested
    /// loop / `Apply`-style operator the planner may insert above this
    /// crate's scope; exercised directly by `Limit`/`Skip`'s own tests).
    fn reset(&mut self) -> GraphResult<()>;

    /// Duplicate this operator (and its subtree) for reuse within a new
    /// plan, with a fresh, unstarted execution state — the static
    /// planning-level template is copied, the mutable per-run state is not.
    fn clone_box(&self) -> Box<dyn Operator>;

    /// Record slots this operator writes. Every operator only ever touches
    /// the indices listed here (spec.md §3 "Record": "every operator only
    /// touches the indices in its static modifies set").
    fn modifies(&self) -> &[SlotIdx];

    /// Release any resources held (staged-but-uncommitted write buffers,
    /// open traversal contexts). Called on normal exhaustion and on the
    /// unwind path after an error (spec.md §5 "Cancellation").
    fn free(&mut self) {}
}

impl Clone for Box<dyn Operator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Drive `root` to exhaustion, modeling the single per-query error
/// boundary spec.md §5 describes ("Each top-level query installs exactly
/// one breakpoint before entering the operator pipeline; on unwind it
/// tears down operator state by invoking `free()` on the DAG root") via
/// ordinary `Result` propagation instead of a thread-local longjmp
/// (spec.md §9 "Source patterns requiring re-architecture").
pub fn run(root: &mut dyn Operator, ctx: &mut QueryContext) -> GraphResult<Vec<Record>> {
    if let Err(e) = root.init(ctx) {
        root.free();
        return Err(e);
    }
    let mut out = Vec::new();
    loop {
        match root.consume(ctx) {
            Ok(Some(record)) => out.push(record),
            Ok(None) => break,
            Err(e) => {
                root.free();
                return Err(e);
            }
        }
    }
    root.free();
    Ok(out)
}
