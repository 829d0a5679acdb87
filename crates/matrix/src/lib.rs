//! Sparse/hypersparse/bitmap/full semiring matrix engine.
//!
//! This crate plays the role `datalog::sparse_matrix` plays in the teacher
//! workspace, generalized from a single Boolean CSR join matrix into the
//! full storage/semiring/kernel machinery spec.md §4.1 describes: four
//! storage variants, a pluggable semiring, and three interchangeable
//! multiply kernels chosen by [`method`]'s cost model.

#![deny(unsafe_code)]

pub mod descriptor;
pub mod kernels;
pub mod method;
pub mod operand;
pub mod sauna;
pub mod semiring;
pub mod storage;

pub use descriptor::{Descriptor, Mask};
pub use operand::{Operand, Ownership};
pub use sauna::Sauna;
pub use semiring::{any_pair, lxor_eq, min_min, min_plus, plus_times, DynSemiring};
pub use storage::{build, Index, Matrix, Storage, StorageKind};
