//! `Operand` — an algebraic-expression leaf: a matrix reference plus
//! `transpose` and `ownership` flags (spec.md §3 "Algebraic expression").
//!
//! Transposition is applied lazily: the first call to [`Operand::resolve`]
//! materializes the transpose once and caches it; the `transpose` flag is
//! then irrelevant for subsequent re-entries (spec.md §4.2 "Evaluation").

use crate::kernels::transpose;
use crate::storage::Matrix;
use std::sync::Arc;

/// `ownership`: whether this operand owns an exclusive, mutable copy of its
/// matrix or merely borrows a shared one (a label/reltype catalog entry
/// read under the catalog's snapshot lock). Matches spec.md §3's
/// "shallow" / owned distinction for matrices, expressed here as a type
/// rather than a runtime flag per buffer, since Rust's borrow checker
/// already enforces "shallow copies must not be user-returned" far more
/// cheaply than a `p_shallow`/`i_shallow` bit ever could.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owned,
    Borrowed,
}

pub struct Operand<T> {
    base: Arc<Matrix<T>>,
    transpose: bool,
    ownership: Ownership,
    cached_transpose: Option<Arc<Matrix<T>>>,
}

impl<T: Clone + Default> Operand<T> {
    pub fn new(base: Arc<Matrix<T>>, transpose: bool, ownership: Ownership) -> Self {
        Self {
            base,
            transpose,
            ownership,
            cached_transpose: None,
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn wants_transpose(&self) -> bool {
        self.transpose
    }

    pub fn base(&self) -> &Arc<Matrix<T>> {
        &self.base
    }

    /// Flip the `transpose` flag, e.g. when the algebra optimizer hoists a
    /// transpose through a product and this operand picks up a second one
    /// (`Tᵀᵀ = T`). Invalidates any cached transpose, since it no longer
    /// reflects the flag it was computed for.
    pub fn toggle_transpose(&mut self) {
        self.transpose = !self.transpose;
        self.cached_transpose = None;
    }

    /// Materialize the operand's effective matrix, transposing once on
    /// first use and reusing the cached result on every subsequent call.
    pub fn resolve(&mut self) -> Arc<Matrix<T>> {
        if !self.transpose {
            return self.base.clone();
        }
        if let Some(cached) = &self.cached_transpose {
            return cached.clone();
        }
        let t = Arc::new(transpose::transpose(&self.base));
        self.cached_transpose = Some(t.clone());
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::build;

    fn path_matrix(edges: &[(usize, usize)], n: usize) -> Matrix<bool> {
        let i: Vec<usize> = edges.iter().map(|&(r, _)| r).collect();
        let j: Vec<usize> = edges.iter().map(|&(_, c)| c).collect();
        let x: Vec<bool> = vec![true; edges.len()];
        build(n, n, &i, &j, &x, |a, b| *a || *b)
    }

    #[test]
    fn untransposed_operand_resolves_to_the_same_matrix() {
        let m = Arc::new(path_matrix(&[(1, 0)], 2));
        let mut op = Operand::new(m.clone(), false, Ownership::Borrowed);
        assert!(Arc::ptr_eq(&op.resolve(), &m));
    }

    #[test]
    fn transposed_operand_caches_after_first_resolve() {
        let m = Arc::new(path_matrix(&[(1, 0)], 2));
        let mut op = Operand::new(m, true, Ownership::Owned);
        let first = op.resolve();
        let second = op.resolve();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.column(0).iter().any(|&(i, v)| i == 0 && v));
    }

    #[test]
    fn toggle_transpose_flips_flag_and_drops_cache() {
        let m = Arc::new(path_matrix(&[(1, 0)], 2));
        let mut op = Operand::new(m.clone(), true, Ownership::Borrowed);
        let _ = op.resolve();
        op.toggle_transpose();
        assert!(!op.wants_transpose());
        assert!(Arc::ptr_eq(&op.resolve(), &m));
    }
}
