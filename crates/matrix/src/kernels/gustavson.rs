//! Gustavson saxpy: `C = A·B`, column-at-a-time (spec.md §4.1).
//!
//! Grounded in `datalog::SparseMatrix::multiply`'s row-scan/column-scan
//! nested loop, replacing its `HashMap<(NodeId,NodeId),bool>` accumulator
//! with the dense [`Sauna`] workspace the spec calls for, and adding the
//! mask-bounded scatter and semiring parameterization the teacher's
//! Boolean-only join matrix didn't need.

use crate::descriptor::Mask;
use crate::sauna::Sauna;
use crate::semiring::DynSemiring;
use crate::storage::Matrix;
use rustc_hash::FxHashSet;

/// `C = A·B` (or `C<M> = A·B` when `mask` is present) using the Gustavson
/// method. Chosen by [`crate::method`] when the expected result is dense
/// enough that reusing one accumulator per column pays off.
pub fn gustavson_mxm<T>(
    a: &Matrix<T>,
    b: &Matrix<T>,
    semiring: &DynSemiring<T>,
    mask: Option<&Mask<'_, T>>,
    sauna: &mut Sauna<T>,
) -> Matrix<T>
where
    T: Clone + Default + PartialEq,
{
    let vlen = a.vlen();
    let vdim = b.vdim();
    sauna.resize(vlen);

    let mut p = vec![0usize; vdim + 1];
    let mut rows_out = Vec::new();
    let mut vals_out = Vec::new();

    for j in 0..vdim {
        sauna.next_column();

        let mask_rows: Option<FxHashSet<usize>> = mask.map(|m| m.matrix.column(j).into_iter().map(|(i, _)| i).collect());
        let admits = |i: usize| mask_rows.as_ref().map_or(true, |rows| rows.contains(&i));

        // Symbolic pass: deposit the pattern — which rows of C(:, j) are
        // reachable at all — without computing values yet.
        for (k, _b_kj) in b.column(j) {
            for (i, _a_ik) in a.column(k) {
                if !admits(i) {
                    continue;
                }
                if !sauna.is_touched(i) {
                    sauna.touch_first(i, T::default());
                }
            }
        }
        let touched = sauna.touched_rows_sorted();

        // Numeric pass: reset each touched accumulator to the monoid
        // identity, then replay the same scan accumulating real values.
        for &i in &touched {
            sauna.touch_first(i, semiring.identity().clone());
        }
        for (k, b_kj) in b.column(j) {
            for (i, a_ik) in a.column(k) {
                if !admits(i) {
                    continue;
                }
                let contribution = semiring.mul(&a_ik, &b_kj);
                sauna.accumulate(i, contribution, |cur, v| semiring.add(cur, v));
            }
        }

        for &i in &touched {
            rows_out.push(i);
            vals_out.push(sauna.value(i).clone());
        }
        p[j + 1] = rows_out.len();
    }

    Matrix::from_sparse(vlen, vdim, p, rows_out, Some(vals_out))
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
    fn two_hop_path_exists_in_product() {
        // edges: 0->1, 1->2 (column-compressed: A(i,j) present iff edge j->i)
        let a = path_matrix(&[(1, 0), (2, 1)], 3);
        let b = a.clone();
        let mut sauna = Sauna::new(3);
        let c = gustavson_mxm(&a, &b, &any_pair(), None, &mut sauna);
        assert!(c.column(0).iter().any(|&(i, v)| i == 2 && v));
    }

    #[test]
    fn mask_restricts_output_rows() {
        let a = path_matrix(&[(1, 0), (2, 1)], 3);
        let b = a.clone();
        let mask_matrix = path_matrix(&[(0, 0)], 3);
        let mask = Mask {
            matrix: &mask_matrix,
            structural: true,
            complement: false,
        };
        let mut sauna = Sauna::new(3);
        let c = gustavson_mxm(&a, &b, &any_pair(), Some(&mask), &mut sauna);
        assert!(c.column(0).is_empty());
    }
}
