//! `Sauna` — the per-thread Gustavson scratch workspace (spec.md §4.1,
//! GLOSSARY: "per-thread scratch workspace for Gustavson kernels (mark
//! array + value array)").
//!
//! The hi-water trick avoids zeroing `mark` between columns: slot `i` is
//! "touched in the current column" iff `mark[i] >= hiwater`. Bumping
//! `hiwater` by 2 between columns (rather than scanning `mark` to reset it)
//! is what makes Gustavson's per-column reuse of a dense accumulator cheap.
//! `hiwater` and `hiwater + 1` distinguish "seen once" from "seen, updated"
//! the way spec.md §4.1 describes, so a caller can tell a first-touch apart
//! from an accumulate without a separate "first" bit.

use smallvec::SmallVec;

const SEEN_ONCE: u64 = 0;
const SEEN_UPDATED: u64 = 1;

pub struct Sauna<T> {
    mark: Vec<u64>,
    work: Vec<T>,
    hiwater: u64,
}

impl<T: Default + Clone> Sauna<T> {
    pub fn new(vlen: usize) -> Self {
        Self {
            mark: vec![0; vlen],
            work: vec![T::default(); vlen],
            hiwater: 2,
        }
    }

    pub fn resize(&mut self, vlen: usize) {
        if self.mark.len() < vlen {
            self.mark.resize(vlen, 0);
            self.work.resize(vlen, T::default());
        }
    }

    /// Advance to a fresh column; no scan over `mark` required.
    pub fn next_column(&mut self) {
        self.hiwater += 2;
    }

    pub fn is_touched(&self, i: usize) -> bool {
        self.mark[i] >= self.hiwater
    }

    /// First contribution to row `i` in the current column.
    pub fn touch_first(&mut self, i: usize, value: T) {
        self.mark[i] = self.hiwater + SEEN_ONCE;
        self.work[i] = value;
    }

    /// A later contribution to an already-touched row; `combine` is the
    /// semiring's `⊕`.
    pub fn accumulate(&mut self, i: usize, value: T, combine: impl Fn(&T, &T) -> T) {
        self.work[i] = combine(&self.work[i], &value);
        self.mark[i] = self.hiwater + SEEN_UPDATED;
    }

    pub fn value(&self, i: usize) -> &T {
        &self.work[i]
    }

    /// Collect the touched rows of the current column, in ascending order,
    /// consuming nothing (the workspace is reused for the next column).
    pub fn touched_rows_sorted(&self) -> SmallVec<[usize; 16]> {
        let mut rows: SmallVec<[usize; 16]> = (0..self.mark.len()).filter(|&i| self.is_touched(i)).collect();
        rows.sort_unstable();
        rows
    }
}
