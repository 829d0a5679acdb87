//! The meta layer: storage-aware method selection, the diagonal row/column
//! scale fast path, and the swap rule (spec.md §4.1 "Method selection").
//!
//! This is the module the rest of the crate is organized to support — every
//! other module (`storage`, `semiring`, `sauna`, `kernels::*`) exists so
//! that `mxm`/`eWiseAdd`/`transpose` here can pick the cheapest correct
//! kernel for a given pair of operands rather than hard-wiring one.

use crate::descriptor::{Descriptor, Mask};
use crate::kernels::{dot, gustavson, heap, transpose as transpose_kernel};
use crate::sauna::Sauna;
use crate::semiring::DynSemiring;
use crate::storage::{Matrix, StorageKind};
use graph_model::{GraphError, GraphResult};

/// `true` iff every present entry of `m` lies on the diagonal — the fast
/// path spec.md §4.1 calls out: "if an operand matrix is known diagonal,
/// the multiply becomes a row- or column-scale and does not allocate an
/// output pattern."
pub fn is_diagonal<T: Clone + Default>(m: &Matrix<T>) -> bool {
    if m.vlen() != m.vdim() {
        return false;
    }
    (0..m.vdim()).all(|j| m.column(j).iter().all(|&(i, _)| i == j))
}

fn scale_rows<T>(diag: &Matrix<T>, b: &Matrix<T>, semiring: &DynSemiring<T>) -> Matrix<T>
where
    T: Clone + Default + PartialEq,
{
    let (vlen, vdim) = (diag.vlen(), b.vdim());
    let mut p = vec![0usize; vdim + 1];
    let mut rows = Vec::new();
    let mut vals = Vec::new();
    for j in 0..vdim {
        for (k, b_kj) in b.column(j) {
            if let Some((_, d_kk)) = diag.column(k).into_iter().find(|&(i, _)| i == k) {
                rows.push(k);
                vals.push(semiring.mul(&d_kk, &b_kj));
            }
        }
        p[j + 1] = rows.len();
    }
    Matrix::from_sparse(vlen, vdim, p, rows, Some(vals))
}

fn scale_cols<T>(a: &Matrix<T>, diag: &Matrix<T>, semiring: &DynSemiring<T>) -> Matrix<T>
where
    T: Clone + Default + PartialEq,
{
    let (vlen, vdim) = (a.vlen(), diag.vdim());
    let mut p = vec![0usize; vdim + 1];
    let mut rows = Vec::new();
    let mut vals = Vec::new();
    for j in 0..vdim {
        if let Some((_, d_jj)) = diag.column(j).into_iter().find(|&(i, _)| i == j) {
            for (i, a_ij) in a.column(j) {
                rows.push(i);
                vals.push(semiring.mul(&a_ij, &d_jj));
            }
        }
        p[j + 1] = rows.len();
    }
    Matrix::from_sparse(vlen, vdim, p, rows, Some(vals))
}

/// `mxm(C, M?, ⊕⊗, A, B, desc) — compute C = A·B or C<M> = A·B`.
pub fn mxm<T>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &DynSemiring<T>,
    mask: Option<&Mask<'_, T>>,
    desc: &Descriptor,
    sauna: &mut Sauna<T>,
) -> GraphResult<Matrix<T>>
where
    T: Clone + Default + PartialEq + Send + Sync,
{
    let a_owned;
    let a_ref: &Matrix<T> = if desc.transpose_a {
        a_owned = transpose_kernel::transpose(a);
        &a_owned
    } else {
        a
    };
    let b_owned;
    let b_ref: &Matrix<T> = if desc.transpose_b {
        b_owned = transpose_kernel::transpose(b);
        &b_owned
    } else {
        b
    };

    if a_ref.vdim() != b_ref.vlen() {
        return Err(GraphError::DimensionMismatch(format!(
            "mxm: {}x{} times {}x{}",
            a_ref.vlen(),
            a_ref.vdim(),
            b_ref.vlen(),
            b_ref.vdim()
        )));
    }

    if is_diagonal(a_ref) {
        tracing::trace!("mxm: row-scale fast path (A is diagonal)");
        return Ok(scale_rows(a_ref, b_ref, semiring));
    }
    if is_diagonal(b_ref) {
        tracing::trace!("mxm: column-scale fast path (B is diagonal)");
        return Ok(scale_cols(a_ref, b_ref, semiring));
    }

    if let Some(mask) = mask {
        tracing::trace!(kernel = "dot3", "mxm: masked product");
        let at = transpose_kernel::transpose(a_ref);
        return Ok(dot::dot3(&at, b_ref, semiring, mask));
    }

    let both_hypersparse = matches!(a_ref.storage_kind(), StorageKind::Hypersparse)
        && matches!(b_ref.storage_kind(), StorageKind::Hypersparse);

    if both_hypersparse {
        tracing::trace!(kernel = "heap_saxpy", "mxm: both operands hypersparse");
        Ok(heap::heap_saxpy(a_ref, b_ref, semiring))
    } else {
        tracing::trace!(kernel = "gustavson", "mxm: dense-enough product");
        Ok(gustavson::gustavson_mxm(a_ref, b_ref, semiring, None, sauna))
    }
}

/// `eWiseAdd(C, ⊕, A, B)` — element-wise combine under monoid `⊕`.
pub fn ewise_add<T>(a: &Matrix<T>, b: &Matrix<T>, add: impl Fn(&T, &T) -> T) -> GraphResult<Matrix<T>>
where
    T: Clone + Default + PartialEq,
{
    if a.dim() != b.dim() {
        return Err(GraphError::DimensionMismatch(format!(
            "eWiseAdd: {:?} vs {:?}",
            a.dim(),
            b.dim()
        )));
    }
    let (vlen, vdim) = a.dim();
    let mut p = vec![0usize; vdim + 1];
    let mut rows = Vec::new();
    let mut vals = Vec::new();
    for j in 0..vdim {
        let mut merged: Vec<(usize, T)> = a.column(j).into_iter().chain(b.column(j)).collect();
        merged.sort_by_key(|(i, _)| *i);
        let mut k = 0;
        while k < merged.len() {
            let i = merged[k].0;
            let mut acc = merged[k].1.clone();
            let mut m = k + 1;
            while m < merged.len() && merged[m].0 == i {
                acc = add(&acc, &merged[m].1);
                m += 1;
            }
            rows.push(i);
            vals.push(acc);
            k = m;
        }
        p[j + 1] = rows.len();
    }
    Ok(Matrix::from_sparse(vlen, vdim, p, rows, Some(vals)))
}

/// `transpose(C, A, desc)` — `C = Aᵀ`.
pub fn transpose<T: Clone + Default>(a: &Matrix<T>) -> Matrix<T> {
    transpose_kernel::transpose(a)
}

/// Swap rule: rewriting `Cᵀ = Aᵀ·Bᵀ` as `C = B·A` avoids transposing
/// whichever operand is larger. Returns `true` when the caller (the
/// algebra optimizer, which knows it needs a transposed result) should
/// multiply in reversed order and transpose the (smaller) output instead
/// of transposing both operands up front.
pub fn should_apply_swap_rule<T: Clone + Default>(a: &Matrix<T>, b: &Matrix<T>) -> bool {
    a.nnz() > b.nnz()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semiring::any_pair;
    use crate::storage::build;

    fn path_matrix(edges: &[(usize, usize)], n: usize) -> Matrix<bool> {
        let i: Vec<usize> = edges.iter().map(|&(r, _)| r).collect();
        let j: Vec<usize> = edges.iter().map(|&(_, c)| c).collect();
        let x: Vec<bool> = vec![true; edges.len()];
        build(n, n, &i, &j, &x, |a, b| *a || *b)
    }

    fn diag(n: usize, present: &[usize]) -> Matrix<bool> {
        let idx: Vec<usize> = present.to_vec();
        build(n, n, &idx, &idx, &vec![true; idx.len()], |a, b| *a || *b)
    }

    #[test]
    fn diagonal_operand_takes_scale_fast_path() {
        let d = diag(3, &[0, 2]);
        let b = path_matrix(&[(1, 0), (2, 1)], 3);
        let mut sauna = Sauna::new(3);
        let c = mxm(&d, &b, &any_pair(), None, &Descriptor::none(), &mut sauna).unwrap();
        // column 0 of B has row 1; D has no entry at row 1, so row-scale drops it.
        assert!(c.column(0).is_empty());
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a: Matrix<bool> = Matrix::empty_sparse(2, 3);
        let b: Matrix<bool> = Matrix::empty_sparse(4, 5);
        let mut sauna = Sauna::new(4);
        let err = mxm(&a, &b, &any_pair(), None, &Descriptor::none(), &mut sauna).unwrap_err();
        assert!(matches!(err, GraphError::DimensionMismatch(_)));
    }

    #[test]
    fn ewise_add_unions_two_patterns() {
        let a = path_matrix(&[(1, 0)], 3);
        let b = path_matrix(&[(2, 0)], 3);
        let c = ewise_add(&a, &b, |x, y| *x || *y).unwrap();
        let mut col0 = c.column(0);
        col0.sort_by_key(|&(i, _)| i);
        assert_eq!(col0, vec![(1, true), (2, true)]);
    }

    #[test]
    fn swap_rule_prefers_transposing_the_smaller_operand() {
        let small = path_matrix(&[(1, 0)], 3);
        let large = path_matrix(&[(0, 0), (1, 0), (2, 1), (0, 2)], 3);
        assert!(should_apply_swap_rule(&large, &small));
        assert!(!should_apply_swap_rule(&small, &large));
    }
}
