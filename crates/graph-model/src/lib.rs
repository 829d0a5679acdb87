//! Core value, reference, and record types shared by every crate in the
//! algebraic graph query engine.
//!
//! This crate plays the role `rdf-model` plays in the teacher workspace: the
//! bottom of the dependency graph, owning the types everything else is
//! indexed or tagged by.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod ids;
pub mod node;
pub mod record;
pub mod value;

pub use error::{GraphError, GraphResult, KernelStatus};
pub use ids::{LabelId, NameTable, NodeId, PropertyKeyId, RelTypeId};
pub use node::{EdgeRef, LabelRef, NodeRef, Path};
pub use record::{record_key, Record, RecordKey, SlotIdx};
pub use value::SIValue;
