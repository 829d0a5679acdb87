//! Matrix storage variants — the four forms a [`Matrix`] may take (spec.md
//! §3). Exactly one variant is live at a time; promotion/demotion between
//! them happens in [`crate::method`], never implicitly inside a kernel.
//!
//! Grounded in `datalog::SparseMatrix`'s CSR (`row_ptr`/`col_indices`) shape,
//! generalized to the column-compressed convention the spec calls for and
//! widened with the hypersparse/bitmap/full variants GraphBLAS's
//! `GB_Pending`/`GxB_Format` headers describe.

use std::fmt;

/// Index into a matrix dimension (row or column).
pub type Index = usize;

/// Column-compressed sparse storage: `p[0..vdim]` is the column-pointer
/// array, `i[0..nnz]` the row indices (sorted within a column unless
/// `jumbled`), `x` the optional value array (absent when the matrix is
/// pattern-only / iso).
#[derive(Debug, Clone)]
pub struct Compressed<T> {
    pub p: Vec<usize>,
    pub i: Vec<Index>,
    pub x: Option<Vec<T>>,
}

impl<T> Compressed<T> {
    pub fn empty(vdim: usize) -> Self {
        Self {
            p: vec![0; vdim + 1],
            i: Vec::new(),
            x: None,
        }
    }

    pub fn nnz(&self) -> usize {
        self.i.len()
    }

    pub fn col(&self, j: usize) -> (&[Index], Option<&[T]>) {
        let start = self.p[j];
        let end = self.p[j + 1];
        (&self.i[start..end], self.x.as_deref().map(|x| &x[start..end]))
    }
}

/// Same layout as [`Compressed`], plus the hyperlist `h` of non-empty vector
/// indices so a matrix with `vdim` in the billions but only a handful of
/// populated columns doesn't pay for a full `p` array scan.
#[derive(Debug, Clone)]
pub struct Hypersparse<T> {
    pub base: Compressed<T>,
    /// Non-empty column indices; `h.len() == nvec`. `base.p` is indexed by
    /// position in `h`, not by raw column index.
    pub h: Vec<Index>,
}

impl<T> Hypersparse<T> {
    pub fn nvec(&self) -> usize {
        self.h.len()
    }

    pub fn nnz(&self) -> usize {
        self.base.nnz()
    }

    /// Find the slot for column `j` in the hyperlist, if it is non-empty.
    pub fn slot_of(&self, j: Index) -> Option<usize> {
        self.h.binary_search(&j).ok()
    }
}

/// Dense presence bits plus dense values, column-major (`bits[j*vlen+i]`).
#[derive(Debug, Clone)]
pub struct Bitmap<T> {
    pub bits: Vec<bool>,
    pub x: Vec<T>,
}

/// Every cell present; no pattern bookkeeping at all.
#[derive(Debug, Clone)]
pub struct Full<T> {
    pub x: Vec<T>,
}

#[derive(Debug, Clone)]
pub enum Storage<T> {
    Sparse(Compressed<T>),
    Hypersparse(Hypersparse<T>),
    Bitmap(Bitmap<T>),
    Full(Full<T>),
}

impl<T> Storage<T> {
    pub fn kind(&self) -> StorageKind {
        match self {
            Storage::Sparse(_) => StorageKind::Sparse,
            Storage::Hypersparse(_) => StorageKind::Hypersparse,
            Storage::Bitmap(_) => StorageKind::Bitmap,
            Storage::Full(_) => StorageKind::Full,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Sparse,
    Hypersparse,
    Bitmap,
    Full,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageKind::Sparse => "sparse",
            StorageKind::Hypersparse => "hypersparse",
            StorageKind::Bitmap => "bitmap",
            StorageKind::Full => "full",
        };
        write!(f, "{s}")
    }
}

/// A `vlen × vdim` matrix in one of the four storage variants.
///
/// `iso` mirrors GraphBLAS's optimization for adjacency/label matrices where
/// every present entry is the same constant (almost always `true` for a
/// Boolean adjacency matrix) — `x` is then omitted entirely and kernels
/// substitute the stored constant. `jumbled` records that `i` within some
/// vector is not sorted (set by bulk `build()`, cleared by `wait()`).
#[derive(Debug, Clone)]
pub struct Matrix<T> {
    vlen: usize,
    vdim: usize,
    storage: Storage<T>,
    iso: Option<T>,
    jumbled: bool,
    nvec_nonempty: Option<usize>,
}

impl<T: Clone> Matrix<T> {
    pub fn empty_sparse(vlen: usize, vdim: usize) -> Self {
        Self {
            vlen,
            vdim,
            storage: Storage::Sparse(Compressed::empty(vdim)),
            iso: None,
            jumbled: false,
            nvec_nonempty: Some(0),
        }
    }

    pub fn empty_hypersparse(vlen: usize, vdim: usize) -> Self {
        Self {
            vlen,
            vdim,
            storage: Storage::Hypersparse(Hypersparse {
                base: Compressed::empty(0),
                h: Vec::new(),
            }),
            iso: None,
            jumbled: false,
            nvec_nonempty: Some(0),
        }
    }

    pub fn full(vlen: usize, vdim: usize, fill: T) -> Self {
        Self {
            vlen,
            vdim,
            storage: Storage::Full(Full {
                x: vec![fill.clone(); vlen * vdim],
            }),
            iso: Some(fill),
            jumbled: false,
            nvec_nonempty: Some(vdim),
        }
    }

    pub fn from_full(vlen: usize, vdim: usize, x: Vec<T>) -> Self {
        debug_assert_eq!(x.len(), vlen * vdim);
        Self {
            vlen,
            vdim,
            storage: Storage::Full(Full { x }),
            iso: None,
            jumbled: false,
            nvec_nonempty: Some(vdim),
        }
    }

    pub fn from_sparse(vlen: usize, vdim: usize, p: Vec<usize>, i: Vec<Index>, x: Option<Vec<T>>) -> Self {
        debug_assert_eq!(p.len(), vdim + 1);
        let nnz = i.len();
        Self {
            vlen,
            vdim,
            storage: Storage::Sparse(Compressed { p, i, x }),
            iso: None,
            jumbled: false,
            nvec_nonempty: if nnz == 0 { Some(0) } else { None },
        }
    }

    pub fn vlen(&self) -> usize {
        self.vlen
    }

    pub fn vdim(&self) -> usize {
        self.vdim
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.vlen, self.vdim)
    }

    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage.kind()
    }

    pub fn is_iso(&self) -> bool {
        self.iso.is_some()
    }

    pub fn iso_value(&self) -> Option<&T> {
        self.iso.as_ref()
    }

    pub fn is_jumbled(&self) -> bool {
        self.jumbled
    }

    pub fn set_jumbled(&mut self, jumbled: bool) {
        self.jumbled = jumbled;
    }

    /// `nnz(A)` — the number of stored (present) entries.
    pub fn nnz(&self) -> usize {
        match &self.storage {
            Storage::Sparse(c) => c.nnz(),
            Storage::Hypersparse(h) => h.nnz(),
            Storage::Bitmap(b) => b.bits.iter().filter(|&&present| present).count(),
            Storage::Full(f) => f.x.len(),
        }
    }

    /// `nvec(A)` — count of non-empty vectors (columns), computing and
    /// caching it if unknown, matching the `-1` ("unknown") cached-or-not
    /// convention from spec.md §3.
    pub fn nvec(&mut self) -> usize {
        if let Some(n) = self.nvec_nonempty {
            return n;
        }
        let n = match &self.storage {
            Storage::Sparse(c) => (0..self.vdim).filter(|&j| c.p[j] != c.p[j + 1]).count(),
            Storage::Hypersparse(h) => h.nvec(),
            Storage::Bitmap(b) => (0..self.vdim)
                .filter(|&j| b.bits[j * self.vlen..(j + 1) * self.vlen].iter().any(|&p| p))
                .count(),
            Storage::Full(_) => self.vdim,
        };
        self.nvec_nonempty = Some(n);
        n
    }

    /// Iterate the non-zero `(row, value)` pairs of column `j`, regardless
    /// of storage variant.
    pub fn column(&self, j: usize) -> Vec<(Index, T)>
    where
        T: Default,
    {
        match &self.storage {
            Storage::Sparse(c) => {
                let (rows, vals) = c.col(j);
                rows.iter()
                    .enumerate()
                    .map(|(k, &i)| {
                        let v = match (&self.iso, vals) {
                            (Some(iso), _) => iso.clone(),
                            (None, Some(vals)) => vals[k].clone(),
                            (None, None) => T::default(),
                        };
                        (i, v)
                    })
                    .collect()
            }
            Storage::Hypersparse(h) => match h.slot_of(j) {
                Some(slot) => {
                    let (rows, vals) = h.base.col(slot);
                    rows.iter()
                        .enumerate()
                        .map(|(k, &i)| {
                            let v = match (&self.iso, vals) {
                                (Some(iso), _) => iso.clone(),
                                (None, Some(vals)) => vals[k].clone(),
                                (None, None) => T::default(),
                            };
                            (i, v)
                        })
                        .collect()
                }
                None => Vec::new(),
            },
            Storage::Bitmap(b) => {
                let base = j * self.vlen;
                (0..self.vlen)
                    .filter(|&i| b.bits[base + i])
                    .map(|i| (i, b.x[base + i].clone()))
                    .collect()
            }
            Storage::Full(f) => {
                let base = j * self.vlen;
                (0..self.vlen).map(|i| (i, f.x[base + i].clone())).collect()
            }
        }
    }

    /// `extract_tuples(A) → (I, J, X)`.
    pub fn extract_tuples(&self) -> (Vec<Index>, Vec<Index>, Vec<T>)
    where
        T: Default,
    {
        let mut is = Vec::with_capacity(self.nnz());
        let mut js = Vec::with_capacity(self.nnz());
        let mut xs = Vec::with_capacity(self.nnz());
        for j in 0..self.vdim {
            for (i, v) in self.column(j) {
                is.push(i);
                js.push(j);
                xs.push(v);
            }
        }
        (is, js, xs)
    }
}

/// `build(I, J, X, ⊕dup) → A` — construct a sparse matrix from coordinate
/// tuples, resolving duplicate `(i, j)` pairs with the supplied monoid.
/// Mirrors `SparseMatrix::from_binary_relation`'s adjacency-list-then-CSR
/// two-pass build, generalized to carry values and a dup-resolution monoid.
pub fn build<T: Clone>(
    vlen: usize,
    vdim: usize,
    i: &[Index],
    j: &[Index],
    x: &[T],
    dup: impl Fn(&T, &T) -> T,
) -> Matrix<T> {
    assert_eq!(i.len(), j.len());
    assert_eq!(i.len(), x.len());

    let mut by_col: Vec<Vec<(Index, T)>> = vec![Vec::new(); vdim];
    for idx in 0..i.len() {
        by_col[j[idx]].push((i[idx], x[idx].clone()));
    }

    let mut p = vec![0usize; vdim + 1];
    let mut rows = Vec::with_capacity(i.len());
    let mut vals = Vec::with_capacity(i.len());

    for col in 0..vdim {
        by_col[col].sort_by_key(|(row, _)| *row);
        let mut k = 0;
        while k < by_col[col].len() {
            let row = by_col[col][k].0;
            let mut acc = by_col[col][k].1.clone();
            let mut m = k + 1;
            while m < by_col[col].len() && by_col[col][m].0 == row {
                acc = dup(&acc, &by_col[col][m].1);
                m += 1;
            }
            rows.push(row);
            vals.push(acc);
            k = m;
        }
        p[col + 1] = rows.len();
    }

    Matrix::from_sparse(vlen, vdim, p, rows, Some(vals))
}
