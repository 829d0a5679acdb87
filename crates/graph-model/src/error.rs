//! The closed error surface shared by every crate in the engine.
//!
//! Mirrors the kind set documented for the query core: a fixed enum instead
//! of ad-hoc string errors, so the outermost query boundary can turn any
//! raised error into exactly one reply to the caller.

use thiserror::Error;

/// Result alias used throughout the engine.
pub type GraphResult<T> = Result<T, GraphError>;

/// The closed set of error kinds the core can raise.
///
/// Compile-time errors (unknown function, duplicate `WITH` column, ...) and
/// runtime errors (missing edge endpoint, division by zero, ...) both land
/// here; callers distinguish them by kind, not by a separate type.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    #[error("unknown property: {0}")]
    UnknownProperty(String),

    #[error("empty scalar")]
    EmptyScalar,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("memory cap exceeded: used {used} bytes, cap {cap} bytes")]
    MemoryCap { used: u64, cap: u64 },

    #[error("internal panic: {0}")]
    InternalPanic(String),
}

/// Non-error kernel outcome.
///
/// `NoValue` is deliberately not a [`GraphError`] variant: it means "this
/// specialized kernel declines, try the generic path," which is data flowing
/// through the method-selection logic, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelStatus {
    Ok,
    OutOfMemory,
    NoValue,
    Invalid,
}

impl KernelStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, KernelStatus::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_by_zero_displays() {
        let e = GraphError::DivisionByZero;
        assert_eq!(e.to_string(), "division by zero");
    }

    #[test]
    fn memory_cap_carries_both_values() {
        let e = GraphError::MemoryCap { used: 2048, cap: 1024 };
        assert!(e.to_string().contains("2048"));
        assert!(e.to_string().contains("1024"));
    }

    #[test]
    fn kernel_status_no_value_is_not_ok() {
        assert!(!KernelStatus::NoValue.is_ok());
        assert!(KernelStatus::Ok.is_ok());
    }
}
