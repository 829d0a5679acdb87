//! Kernel implementations dispatched by [`crate::method`]. Each kernel is a
//! pure function over borrowed matrices — method selection, not the kernel
//! itself, owns workspace lifetime and the `NO_VALUE`/`OUT_OF_MEMORY`
//! failure contract (spec.md §4.1 "Failure model").

pub mod dot;
pub mod gustavson;
pub mod heap;
pub mod transpose;
