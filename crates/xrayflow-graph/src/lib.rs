//! xrayflow Graph
//!
//! Generic directed-graph bookkeeping used by the executor: a registry of
//! vertices and metadata-carrying edges that stays acyclic, plus the
//! traversal algorithms the scheduler and the pipeline builder need.
//!
//! The graph knows nothing about what its vertices represent. The executor
//! keys it by command id and keeps the commands themselves alongside.

mod error;
mod graph;
mod traversal;

pub use error::GraphError;
pub use graph::DirectedGraph;
