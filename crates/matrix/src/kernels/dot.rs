//! Dot-product kernels: `C<M> = Aᵀ·B` (spec.md §4.1).
//!
//! Unlike Gustavson, which scatters from `B`'s columns through `A`'s
//! columns, dot treats each masked `(i, j)` cell independently by merging
//! two already-sorted columns — `A(:, i)` and `B(:, j)` — the way a sorted
//! merge-join would. `dot2` computes every masked cell eagerly (used when
//! `C` itself is dense, so "no value" isn't representable as "absent").
//! `dot3` tracks entries that produced no value as zombies so the sparse
//! output can compact them away in one pass rather than reallocating.

use crate::descriptor::Mask;
use crate::semiring::DynSemiring;
use crate::storage::Matrix;
use rayon::prelude::*;

/// Merge sorted columns `A(:, i)` and `B(:, j)`, accumulating
/// `⊕_k A(k, i) ⊗ B(k, j)` with early exit at the semiring's terminal value.
fn dot_cell<T>(a_col: &[(usize, T)], b_col: &[(usize, T)], semiring: &DynSemiring<T>) -> Option<T>
where
    T: Clone + PartialEq,
{
    let mut acc: Option<T> = None;
    let (mut pa, mut pb) = (0, 0);
    while pa < a_col.len() && pb < b_col.len() {
        let (ka, va) = &a_col[pa];
        let (kb, vb) = &b_col[pb];
        match ka.cmp(kb) {
            std::cmp::Ordering::Less => pa += 1,
            std::cmp::Ordering::Greater => pb += 1,
            std::cmp::Ordering::Equal => {
                let contribution = semiring.mul(va, vb);
                acc = Some(match acc {
                    Some(prev) => semiring.add(&prev, &contribution),
                    None => contribution,
                });
                if let Some(acc_val) = &acc {
                    if semiring.is_terminal(acc_val) {
                        break;
                    }
                }
                pa += 1;
                pb += 1;
            }
        }
    }
    acc
}

/// `dot2` — `C` is bitmap/full: every masked `(i, j)` is computed
/// independently and unconditionally written (absence of a contribution
/// just becomes the monoid identity), so the whole mask pattern can be
/// split across threads with no shared mutable state.
pub fn dot2<T>(at: &Matrix<T>, b: &Matrix<T>, semiring: &DynSemiring<T>, mask: &Mask<'_, T>) -> Matrix<T>
where
    T: Clone + Default + PartialEq + Send + Sync,
{
    let vlen = at.vdim();
    let vdim = b.vdim();

    let cells: Vec<(usize, usize, T)> = (0..vdim)
        .into_par_iter()
        .flat_map(|j| {
            let mask_col = mask.matrix.column(j);
            let b_col = b.column(j);
            mask_col
                .into_par_iter()
                .filter_map(move |(i, _)| {
                    let a_col = at.column(i);
                    dot_cell(&a_col, &b_col, semiring).map(|v| (i, j, v))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let mut values = vec![semiring.identity().clone(); vlen * vdim];
    for (i, j, v) in &cells {
        values[j * vlen + i] = v.clone();
    }
    Matrix::from_full(vlen, vdim, values)
}

/// `dot3` — `C` is sparse/hyper and must match `M`'s pattern exactly: a
/// work estimator sizes each mask column's cost, a slicer hands balanced
/// chunks of `(i, j)` pairs to worker threads, and cells that yield no
/// contribution become zombies, compacted away before the final build.
pub fn dot3<T>(at: &Matrix<T>, b: &Matrix<T>, semiring: &DynSemiring<T>, mask: &Mask<'_, T>) -> Matrix<T>
where
    T: Clone + Default + PartialEq + Send + Sync,
{
    let vlen = at.vdim();
    let vdim = b.vdim();

    // Phase 1: work estimator — cost of column j is |M(:,j)| * avg degree.
    let work_per_col: Vec<usize> = (0..vdim)
        .map(|j| mask.matrix.column(j).len().max(1))
        .collect();
    let total_work: usize = work_per_col.iter().sum();
    let target_chunk = (total_work / rayon::current_num_threads().max(1)).max(1);

    // Phase 2: slice columns into balanced chunks and evaluate in parallel,
    // tagging no-value cells as zombies (simply omitted from the output —
    // Rust's ownership model means there's no "tombstone" to later GC, so
    // compaction here is just "never materialize it").
    let mut chunks: Vec<Vec<usize>> = Vec::new();
    let mut current = Vec::new();
    let mut current_work = 0;
    for j in 0..vdim {
        current.push(j);
        current_work += work_per_col[j];
        if current_work >= target_chunk {
            chunks.push(std::mem::take(&mut current));
            current_work = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    let per_chunk: Vec<Vec<(usize, usize, T)>> = chunks
        .into_par_iter()
        .map(|cols| {
            let mut local = Vec::new();
            for j in cols {
                let b_col = b.column(j);
                for (i, _) in mask.matrix.column(j) {
                    let a_col = at.column(i);
                    if let Some(v) = dot_cell(&a_col, &b_col, semiring) {
                        local.push((i, j, v));
                    }
                }
            }
            local
        })
        .collect();

    let mut by_col: Vec<Vec<(usize, T)>> = vec![Vec::new(); vdim];
    for chunk in per_chunk {
        for (i, j, v) in chunk {
            by_col[j].push((i, v));
        }
    }

    let mut p = vec![0usize; vdim + 1];
    let mut rows = Vec::new();
    let mut vals = Vec::new();
    for j in 0..vdim {
        by_col[j].sort_by_key(|(i, _)| *i);
        for (i, v) in &by_col[j] {
            rows.push(*i);
            vals.push(v.clone());
        }
        p[j + 1] = rows.len();
    }

    Matrix::from_sparse(vlen, vdim, p, rows, Some(vals))
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

    #[test]
    fn dot3_matches_gustavson_on_same_inputs() {
        let a = path_matrix(&[(1, 0), (2, 1)], 3);
        let b = a.clone();
        let at = crate::kernels::transpose::bucket_transpose(&a);
        let full_mask = Matrix::full(3, 3, true);
        let mask = Mask {
            matrix: &full_mask,
            structural: true,
            complement: false,
        };
        let c = dot3(&at, &b, &any_pair(), &mask);
        assert!(c.column(0).iter().any(|&(i, v)| i == 2 && v));
    }
}
