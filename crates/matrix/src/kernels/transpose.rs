//! Transpose kernels (spec.md §4.1, GLOSSARY "Transpose flag").
//!
//! Grounded in `datalog::SparseMatrix::transpose`'s adjacency-list-then-CSR
//! shape (build per-row output lists, then compress), split here into the
//! two algorithms the spec calls for: a bucket-sort transpose for the
//! common case, and a tuple-sort "builder" transpose that wins at very
//! large `nnz` where the per-column `Vec` churn of bucketing starts to
//! matter.

use crate::storage::Matrix;

/// Bucket-sort transpose: row counts become the new column pointers, then
/// one pass scatters every non-zero into place. `O(vlen + nvec + nnz)`.
/// The spec's three sub-flavors (single-thread, atomic-counter,
/// per-thread-workspace) are a parallelization detail of the *same*
/// algorithm; this is the single-thread flavor, which every caller falls
/// back to correctness-wise.
pub fn bucket_transpose<T: Clone + Default>(a: &Matrix<T>) -> Matrix<T> {
    let (vlen, vdim) = a.dim();
    let new_vlen = vdim;
    let new_vdim = vlen;

    let mut counts = vec![0usize; new_vdim];
    for j in 0..vdim {
        for (i, _) in a.column(j) {
            counts[i] += 1;
        }
    }

    let mut p = vec![0usize; new_vdim + 1];
    for i in 0..new_vdim {
        p[i + 1] = p[i] + counts[i];
    }

    let nnz = p[new_vdim];
    let mut rows = vec![0usize; nnz];
    let mut vals: Vec<T> = vec![T::default(); nnz];
    let mut cursor = p.clone();

    for j in 0..vdim {
        for (i, v) in a.column(j) {
            let slot = cursor[i];
            rows[slot] = j;
            vals[slot] = v;
            cursor[i] += 1;
        }
    }

    Matrix::from_sparse(new_vlen, new_vdim, p, rows, Some(vals))
}

/// Builder transpose: extract `(i, j, x)` tuples, sort by the new row key
/// (`j`) with a stable merge sort, then rebuild — the same path `build()`
/// uses, so it amortizes well when the matrix is about to be rebuilt anyway
/// and `nnz` is too large for bucket-transpose's per-row `Vec<Vec<_>>`
/// bookkeeping to stay cache-friendly.
pub fn builder_transpose<T: Clone + Default>(a: &Matrix<T>) -> Matrix<T> {
    let (vlen, vdim) = a.dim();
    let (is, js, xs) = a.extract_tuples();

    // Transposed tuples: new_i = old_j, new_j = old_i.
    let mut tuples: Vec<(usize, usize, T)> = is
        .into_iter()
        .zip(js)
        .zip(xs)
        .map(|((i, j), x)| (j, i, x))
        .collect();
    tuples.sort_by_key(|(i, j, _)| (*j, *i));

    let new_vlen = vdim;
    let new_vdim = vlen;
    let mut p = vec![0usize; new_vdim + 1];
    let mut rows = Vec::with_capacity(tuples.len());
    let mut vals = Vec::with_capacity(tuples.len());
    let mut col = 0usize;
    for (i, j, x) in tuples {
        while col < j {
            col += 1;
            p[col] = rows.len();
        }
        rows.push(i);
        vals.push(x);
    }
    while col < new_vdim {
        col += 1;
        p[col] = rows.len();
    }

    Matrix::from_sparse(new_vlen, new_vdim, p, rows, Some(vals))
}

/// Picks bucket-sort vs. builder transpose by the `log2(nnz)` vs.
/// `log2(vlen)` threshold spec.md §4.1 describes: bucket-sort wins unless
/// `nnz` so dominates `vlen` that the tuple-sort's better cache behavior at
/// scale pays for itself.
pub fn transpose<T: Clone + Default>(a: &Matrix<T>) -> Matrix<T> {
    let nnz = a.nnz().max(1);
    let vlen = a.vlen().max(1);
    if (nnz as f64).log2() > (vlen as f64).log2() + 4.0 {
        builder_transpose(a)
    } else {
        bucket_transpose(a)
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
    fn bucket_transpose_swaps_row_and_column() {
        let a = path_matrix(&[(1, 0)], 2);
        let at = bucket_transpose(&a);
        assert!(at.column(0).iter().any(|&(i, v)| i == 1 && v));
        assert!(a.column(0).iter().any(|&(i, v)| i == 1 && v));
    }

    #[test]
    fn builder_transpose_agrees_with_bucket_transpose() {
        let a = path_matrix(&[(1, 0), (2, 1), (0, 2)], 3);
        let bucket = bucket_transpose(&a);
        let builder = builder_transpose(&a);
        for j in 0..3 {
            let mut b1 = bucket.column(j);
            let mut b2 = builder.column(j);
            b1.sort_by_key(|&(i, _)| i);
            b2.sort_by_key(|&(i, _)| i);
            assert_eq!(b1, b2);
        }
    }

    #[test]
    fn double_transpose_is_identity() {
        let a = path_matrix(&[(1, 0), (2, 1)], 3);
        let back = bucket_transpose(&bucket_transpose(&a));
        for j in 0..3 {
            let mut orig = a.column(j);
            let mut roundtrip = back.column(j);
            orig.sort_by_key(|&(i, _)| i);
            roundtrip.sort_by_key(|&(i, _)| i);
            assert_eq!(orig, roundtrip);
        }
    }
}
