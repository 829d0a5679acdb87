//! Heap saxpy (spec.md §4.1: "When both `A` and `B` are hypersparse with
//! few non-empty columns, build a min-heap of current row-indices across
//! the active `A(:, k)` columns selected by `B(:, j)`").
//!
//! Gustavson pays `O(vlen)` per column just to allocate/scan the Sauna
//! workspace; when `A` and `B` are both hypersparse this dwarfs the actual
//! work, so heap saxpy merges the active columns directly instead.

use crate::semiring::DynSemiring;
use crate::storage::Matrix;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

struct Cursor<'a, T> {
    col: &'a [(usize, T)],
    pos: usize,
    b_kj: T,
}

/// `C = A·B` by merging the active columns of `A` selected by `B(:, j)`'s
/// non-zeros, one output column at a time. Correct for any matrix shape,
/// but only chosen by [`crate::method`] when both operands are hypersparse
/// and sparse enough that Gustavson's dense accumulator would be wasteful.
pub fn heap_saxpy<T>(a: &Matrix<T>, b: &Matrix<T>, semiring: &DynSemiring<T>) -> Matrix<T>
where
    T: Clone + Default + PartialEq,
{
    let vlen = a.vlen();
    let vdim = b.vdim();

    let mut p = vec![0usize; vdim + 1];
    let mut rows_out = Vec::new();
    let mut vals_out = Vec::new();

    for j in 0..vdim {
        let b_col = b.column(j);
        if b_col.is_empty() {
            p[j + 1] = rows_out.len();
            continue;
        }

        let mut columns: Vec<Vec<(usize, T)>> = Vec::with_capacity(b_col.len());
        for (k, _) in &b_col {
            columns.push(a.column(*k));
        }

        let mut cursors: Vec<Cursor<'_, T>> = Vec::new();
        let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();
        for (idx, col) in columns.iter().enumerate() {
            if !col.is_empty() {
                heap.push(Reverse((col[0].0, idx)));
            }
        }
        for (idx, col) in columns.iter().enumerate() {
            cursors.push(Cursor {
                col,
                pos: 0,
                b_kj: b_col[idx].1.clone(),
            });
        }

        let mut last_row: Option<usize> = None;
        let mut acc = semiring.identity().clone();
        while let Some(Reverse((row, idx))) = heap.pop() {
            let cursor = &mut cursors[idx];
            let (_, a_ik) = &cursor.col[cursor.pos];
            let contribution = semiring.mul(a_ik, &cursor.b_kj);

            match last_row {
                Some(r) if r == row => {
                    acc = semiring.add(&acc, &contribution);
                }
                Some(r) => {
                    rows_out.push(r);
                    vals_out.push(acc);
                    acc = contribution;
                }
                None => {
                    acc = contribution;
                }
            }
            last_row = Some(row);

            cursor.pos += 1;
            if cursor.pos < cursor.col.len() {
                heap.push(Reverse((cursor.col[cursor.pos].0, idx)));
            }
        }
        if let Some(r) = last_row {
            rows_out.push(r);
            vals_out.push(acc);
        }
        p[j + 1] = rows_out.len();
    }

    Matrix::from_sparse(vlen, vdim, p, rows_out, Some(vals_out))
}
