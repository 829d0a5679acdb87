//! `Aggregate`: average is computed as a running (shifted) mean, not
//! `sum/count`, to bound floating-point error growth over long groups;
//! sample variance/stdev use Welford's online algorithm with the `n-1`
//! denominator. Buckets records by a group-key expression list, folding
//! each bucket through one [`RunningStats`] accumulator per aggregate
//! function, and emits one record per distinct group once the child is
//! exhausted.
//!
//! Grounded in `datalog::lib`'s group-by-then-fold accumulation shape,
//! generalized from Datalog aggregate rules to Cypher `RETURN`-clause
//! aggregation functions. The per-group bucket key is the group values'
//! `Display` join rather than hashing `SIValue` directly, since `Double`
//! does not implement `Hash`/`Eq`.

use crate::context::QueryContext;
use crate::expr::{eval, Expr};
use crate::record_stream::Operator;
use graph_model::{GraphResult, Record, SIValue, SlotIdx};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub enum AggFunc {
    /// `count(*)` when `None`, `count(expr)` (non-null values only) when `Some`.
    Count(Option<Expr>),
    Sum(Expr),
    Avg(Expr),
    Min(Expr),
    Max(Expr),
    StdevSamp(Expr),
    Variance(Expr),
}

#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub func: AggFunc,
    pub dest_slot: SlotIdx,
}

/// Welford's online mean/variance accumulator (spec.md §4.4).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (`n-1` denominator); `0.0` for fewer than two samples.
    fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }
}

enum Accumulator {
    Count { non_null_only: bool, count: i64 },
    Sum { total_int: i64, total_f64: f64, saw_float: bool },
    Avg(RunningStats),
    Min(Option<SIValue>),
    Max(Option<SIValue>),
    StdevSamp(RunningStats),
    Variance(RunningStats),
}

impl Accumulator {
    fn new(func: &AggFunc) -> Self {
        match func {
            AggFunc::Count(expr) => Accumulator::Count { non_null_only: expr.is_some(), count: 0 },
            AggFunc::Sum(_) => Accumulator::Sum { total_int: 0, total_f64: 0.0, saw_float: false },
            AggFunc::Avg(_) => Accumulator::Avg(RunningStats::default()),
            AggFunc::Min(_) => Accumulator::Min(None),
            AggFunc::Max(_) => Accumulator::Max(None),
            AggFunc::StdevSamp(_) => Accumulator::StdevSamp(RunningStats::default()),
            AggFunc::Variance(_) => Accumulator::Variance(RunningStats::default()),
        }
    }

    fn feed(&mut self, value: SIValue) {
        match self {
            Accumulator::Count { non_null_only, count } => {
                if !*non_null_only || !value.is_null() {
                    *count += 1;
                }
            }
            Accumulator::Sum { total_int, total_f64, saw_float } => match value {
                SIValue::Int64(i) => *total_int += i,
                SIValue::Double(d) => {
                    *saw_float = true;
                    *total_f64 += d;
                }
                _ => {}
            },
            Accumulator::Avg(stats) | Accumulator::StdevSamp(stats) | Accumulator::Variance(stats) => {
                if let Some(f) = value.as_f64() {
                    stats.update(f);
                }
            }
            Accumulator::Min(slot) => {
                if !value.is_null() {
                    let replace = match slot {
                        None => true,
                        Some(cur) => value.partial_cmp(cur).map(|o| o.is_lt()).unwrap_or(false),
                    };
                    if replace {
                        *slot = Some(value);
                    }
                }
            }
            Accumulator::Max(slot) => {
                if !value.is_null() {
                    let replace = match slot {
                        None => true,
                        Some(cur) => value.partial_cmp(cur).map(|o| o.is_gt()).unwrap_or(false),
                    };
                    if replace {
                        *slot = Some(value);
                    }
                }
            }
        }
    }

    fn finish(self) -> SIValue {
        match self {
            Accumulator::Count { count, .. } => SIValue::Int64(count),
            Accumulator::Sum { total_int, total_f64, saw_float } => {
                if saw_float {
                    SIValue::Double(total_f64 + total_int as f64)
                } else {
                    SIValue::Int64(total_int)
                }
            }
            Accumulator::Avg(stats) => SIValue::Double(stats.mean()),
            Accumulator::StdevSamp(stats) => SIValue::Double(stats.sample_variance().sqrt()),
            Accumulator::Variance(stats) => SIValue::Double(stats.sample_variance()),
            Accumulator::Min(slot) => slot.unwrap_or(SIValue::Null),
            Accumulator::Max(slot) => slot.unwrap_or(SIValue::Null),
        }
    }
}

struct Bucket {
    group_values: Vec<SIValue>,
    accumulators: Vec<Accumulator>,
}

pub struct Aggregate {
    child: Box<dyn Operator>,
    group_by: Vec<(Expr, SlotIdx)>,
    aggregates: Vec<AggregateSpec>,
    output_width: usize,
    buckets: FxHashMap<String, Bucket>,
    order: Vec<String>,
    drain_cursor: usize,
    drained: bool,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn Operator>,
        group_by: Vec<(Expr, SlotIdx)>,
        aggregates: Vec<AggregateSpec>,
        output_width: usize,
    ) -> Self {
        Self {
            child,
            group_by,
            aggregates,
            output_width,
            buckets: FxHashMap::default(),
            order: Vec::new(),
            drain_cursor: 0,
            drained: false,
        }
    }

    fn group_key(values: &[SIValue]) -> String {
        let mut key = String::new();
        for v in values {
            key.push_str(&v.to_string());
            key.push('\u{1}');
        }
        key
    }
}

impl Operator for Aggregate {
    fn init(&mut self, ctx: &mut QueryContext) -> GraphResult<()> {
        self.buckets.clear();
        self.order.clear();
        self.drain_cursor = 0;
        self.drained = false;
        self.child.init(ctx)
    }

    fn consume(&mut self, ctx: &mut QueryContext) -> GraphResult<Option<Record>> {
        if !self.drained {
            while let Some(record) = self.child.consume(ctx)? {
                let group_values = self
                    .group_by
                    .iter()
                    .map(|(expr, _)| eval(expr, &record, &ctx.graph))
                    .collect::<GraphResult<Vec<_>>>()?;
                let key = Self::group_key(&group_values);

                if !self.buckets.contains_key(&key) {
                    let accumulators = self.aggregates.iter().map(|spec| Accumulator::new(&spec.func)).collect();
                    self.buckets.insert(
                        key.clone(),
                        Bucket {
                            group_values: group_values.clone(),
                            accumulators,
                        },
                    );
                    self.order.push(key.clone());
                }

                let bucket = self.buckets.get_mut(&key).expect("just inserted");
                for (spec, accumulator) in self.aggregates.iter().zip(bucket.accumulators.iter_mut()) {
                    match &spec.func {
                        AggFunc::Count(None) => accumulator.feed(SIValue::Bool(true)),
                        AggFunc::Count(Some(e))
                        | AggFunc::Sum(e)
                        | AggFunc::Avg(e)
                        | AggFunc::Min(e)
                        | AggFunc::Max(e)
                        | AggFunc::StdevSamp(e)
                        | AggFunc::Variance(e) => {
                            let value = eval(e, &record, &ctx.graph)?;
                            accumulator.feed(value);
                        }
                    }
                }
            }
            self.drained = true;
        }

        let Some(key) = self.order.get(self.drain_cursor).cloned() else {
            return Ok(None);
        };
        self.drain_cursor += 1;
        let bucket = self.buckets.remove(&key).expect("order and buckets stay in sync");

        let mut output = Record::with_width(self.output_width);
        for ((_, slot), value) in self.group_by.iter().zip(bucket.group_values.into_iter()) {
            output.set(*slot, value);
        }
        for (spec, accumulator) in self.aggregates.iter().zip(bucket.accumulators.into_iter()) {
            output.set(spec.dest_slot, accumulator.finish());
        }
        Ok(Some(output))
    }

    fn reset(&mut self) -> GraphResult<()> {
        self.buckets.clear();
        self.order.clear();
        self.drain_cursor = 0;
        self.drained = false;
        self.child.reset()
    }

    fn clone_box(&self) -> Box<dyn Operator> {
        Box::new(Self::new(self.child.clone_box(), self.group_by.clone(), self.aggregates.clone(), self.output_width))
    }

    fn modifies(&self) -> &[SlotIdx] {
        &[]
    }

    fn free(&mut self) {
        self.buckets.clear();
        self.child.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::scan::AllNodeScan;
    use catalog::{Graph, PendingMutations, PendingNode, RuntimeConfig};
    use std::sync::Arc;

    #[test]
    fn count_star_counts_all_input_rows() {
        let g = Graph::default();
        let mut pending = PendingMutations::default();
        for _ in 0..4 {
            let id = g.reserve_node_id();
            pending.node_creates.push(PendingNode { id, labels: Default::default(), properties: Default::default() });
        }
        g.commit(pending).unwrap();

        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 1));
        let mut op = Aggregate::new(scan, vec![], vec![AggregateSpec { func: AggFunc::Count(None), dest_slot: 0 }], 1);
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get(0), &SIValue::Int64(4));
    }

    #[test]
    fn grouped_count_buckets_by_property_value() {
        let g = Graph::default();
        let key = g.properties().intern("team");
        let a1 = g.reserve_node_id();
        let a2 = g.reserve_node_id();
        let b1 = g.reserve_node_id();
        let mut pending = PendingMutations::default();
        let mut red = rustc_hash::FxHashMap::default();
        red.insert(key, SIValue::string("red"));
        pending.node_creates.push(PendingNode { id: a1, labels: Default::default(), properties: red.clone() });
        pending.node_creates.push(PendingNode { id: a2, labels: Default::default(), properties: red });
        let mut blue = rustc_hash::FxHashMap::default();
        blue.insert(key, SIValue::string("blue"));
        pending.node_creates.push(PendingNode { id: b1, labels: Default::default(), properties: blue });
        g.commit(pending).unwrap();

        let mut ctx = QueryContext::new(Arc::new(g), RuntimeConfig::default());
        let scan = Box::new(AllNodeScan::new(0, 2));
        let group_expr = Expr::Property(Box::new(Expr::Slot(0)), key);
        let mut op = Aggregate::new(
            scan,
            vec![(group_expr, 0)],
            vec![AggregateSpec { func: AggFunc::Count(None), dest_slot: 1 }],
            2,
        );
        let out = crate::record_stream::run(&mut op, &mut ctx).unwrap();
        assert_eq!(out.len(), 2);
        let total: i64 = out.iter().map(|r| match r.get(1) {
            SIValue::Int64(n) => *n,
            _ => 0,
        }).sum();
        assert_eq!(total, 3);
    }
}
