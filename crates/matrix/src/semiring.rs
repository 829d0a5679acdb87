//! Semirings — `S = (⊕, ⊗, 0, ⊤?)` (spec.md §3).
//!
//! The built-in semirings are monomorphic Rust types so `mxm` callers who
//! know the semiring at compile time pay nothing for it, but the matrix
//! kernels themselves are threaded a [`DynSemiring`] — a closure bundle, not
//! a generic parameter — because the planner picks a semiring by name at
//! plan-build time (spec.md §3: "user semirings are black-box function
//! pointers with explicit `xtype`, `ytype`, `ztype`"), so the kernel layer
//! can't be monomorphized per semiring without recompiling per query shape.

use std::fmt;
use std::sync::Arc;

/// A semiring over a single value type `T` (our kernels never mix
/// `xtype`/`ytype`/`ztype`; every operand and the output share `T`).
pub struct DynSemiring<T> {
    pub name: &'static str,
    pub identity: T,
    add: Arc<dyn Fn(&T, &T) -> T + Send + Sync>,
    mul: Arc<dyn Fn(&T, &T) -> T + Send + Sync>,
    terminal: Option<T>,
}

impl<T> Clone for DynSemiring<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            identity: self.identity.clone(),
            add: self.add.clone(),
            mul: self.mul.clone(),
            terminal: self.terminal.clone(),
        }
    }
}

impl<T> fmt::Debug for DynSemiring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynSemiring").field("name", &self.name).finish()
    }
}

impl<T> DynSemiring<T> {
    pub fn new(
        name: &'static str,
        identity: T,
        add: impl Fn(&T, &T) -> T + Send + Sync + 'static,
        mul: impl Fn(&T, &T) -> T + Send + Sync + 'static,
        terminal: Option<T>,
    ) -> Self {
        Self {
            name,
            identity,
            add: Arc::new(add),
            mul: Arc::new(mul),
            terminal,
        }
    }

    pub fn add(&self, a: &T, b: &T) -> T {
        (self.add)(a, b)
    }

    pub fn mul(&self, a: &T, b: &T) -> T {
        (self.mul)(a, b)
    }

    pub fn identity(&self) -> &T {
        &self.identity
    }

    pub fn terminal(&self) -> Option<&T> {
        self.terminal.as_ref()
    }

    /// Whether `value` is the terminal annihilator, allowing a dot-product
    /// scan to break early (spec.md §4.1: "Terminal early-exit").
    pub fn is_terminal(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        matches!(&self.terminal, Some(t) if t == value)
    }
}

/// `ANY_PAIR` — the Boolean "does a path exist" semiring used for plain
/// adjacency traversal: `⊕ = OR`, `⊗ = AND` (in practice `AND` over two
/// present pattern entries, since adjacency matrices are iso-`true`),
/// terminal `true` (once any contribution is found, no need to keep
/// scanning a dot product).
pub fn any_pair() -> DynSemiring<bool> {
    DynSemiring::new("ANY_PAIR", false, |a, b| *a || *b, |a, b| *a && *b, Some(true))
}

/// `PLUS_TIMES` — ordinary numeric matrix multiplication, e.g. for counting
/// walks or weighting edges.
pub fn plus_times() -> DynSemiring<f64> {
    DynSemiring::new("PLUS_TIMES", 0.0, |a, b| a + b, |a, b| a * b, None)
}

/// `MIN_PLUS` — tropical semiring used for shortest-path style
/// accumulation: `⊕ = min`, `⊗ = +`.
pub fn min_plus() -> DynSemiring<f64> {
    DynSemiring::new(
        "MIN_PLUS",
        f64::INFINITY,
        |a, b| a.min(*b),
        |a, b| a + b,
        None,
    )
}

/// `MIN_MIN` — both monoid and multiplier are `min`, used for bottleneck /
/// widest-path style queries.
pub fn min_min() -> DynSemiring<f64> {
    DynSemiring::new(
        "MIN_MIN",
        f64::INFINITY,
        |a, b| a.min(*b),
        |a, b| a.min(*b),
        None,
    )
}

/// `LXOR_EQ` — `⊕ = logical xor`, `⊗ = logical eq`; used where a cell
/// should flip on an odd number of contributions (e.g. parity reachability).
pub fn lxor_eq() -> DynSemiring<bool> {
    DynSemiring::new("LXOR_EQ", false, |a, b| a != b, |a, b| a == b, None)
}

/// Look a built-in semiring up by its spec.md §3 name.
pub fn builtin_bool(name: &str) -> Option<DynSemiring<bool>> {
    match name {
        "ANY_PAIR" => Some(any_pair()),
        "LXOR_EQ" => Some(lxor_eq()),
        _ => None,
    }
}

pub fn builtin_f64(name: &str) -> Option<DynSemiring<f64>> {
    match name {
        "PLUS_TIMES" => Some(plus_times()),
        "MIN_PLUS" => Some(min_plus()),
        "MIN_MIN" => Some(min_min()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_pair_terminal_is_true() {
        let s = any_pair();
        assert!(s.is_terminal(&true));
        assert!(!s.is_terminal(&false));
    }

    #[test]
    fn plus_times_has_no_terminal() {
        let s = plus_times();
        assert!(s.terminal().is_none());
    }

    #[test]
    fn min_plus_identity_is_infinity() {
        let s = min_plus();
        assert_eq!(*s.identity(), f64::INFINITY);
        assert_eq!(s.add(&3.0, &5.0), 3.0);
        assert_eq!(s.mul(&3.0, &5.0), 8.0);
    }

    #[test]
    fn builtin_lookup_by_name() {
        assert!(builtin_bool("ANY_PAIR").is_some());
        assert!(builtin_bool("PLUS_TIMES").is_none());
        assert!(builtin_f64("PLUS_TIMES").is_some());
    }
}
