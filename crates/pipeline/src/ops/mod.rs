//! The operator library: every concrete [`crate::record_stream::Operator`]
//! implementation a query plan can be built from.

pub mod aggregate;
pub mod all_shortest_paths;
pub mod conditional_traverse;
pub mod create;
pub mod delete;
pub mod filter;
pub mod limit;
pub mod merge;
pub mod merge_create;
pub mod project;
pub mod scan;
pub mod unwind;
pub mod update;
pub mod var_len_traverse;

pub use aggregate::{AggFunc, Aggregate, AggregateSpec};
pub use all_shortest_paths::AllShortestPaths;
pub use conditional_traverse::ConditionalTraverse;
pub use create::{Create, EdgeCreateCtx, NodeCreateCtx};
pub use delete::Delete;
pub use filter::Filter;
pub use limit::{Limit, Skip};
pub use merge::Merge;
pub use merge_create::{EdgeMergeCreateCtx, MergeCreate, NodeMergeCreateCtx};
pub use project::Project;
pub use scan::{AllNodeScan, NodeByLabelScan};
pub use unwind::Unwind;
pub use update::{Mutation, Update, UpdateSpec};
pub use var_len_traverse::{TraverseDirection, VarLenTraverse};
