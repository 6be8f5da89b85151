//! xrayflow Executor
//!
//! [`ExecutableGraph`] schedules commands along their dependency edges.
//!
//! - Vertices are launched concurrently as soon as every predecessor settled.
//! - A vertex whose required predecessor failed or was skipped is skipped
//!   itself and never runs; optional predecessors only order execution.
//! - Failures never abort the pass. Every vertex is reported in the
//!   [`ExecutionResult`], and [`report`] helps callers decide what is fatal.
//!
//! # Usage
//!
//! ```ignore
//! let graph = ExecutableGraph::new();
//! let parse = graph.place(Arc::new(parse_command))?;
//! let upload = graph.place(Arc::new(upload_command))?;
//! graph.connect(&parse, &upload, EdgeOptions::required())?;
//!
//! let result = graph.execute().await;
//! report::log_outcomes(&result);
//! report::require_any_succeeded(&result, [&upload], "import")?;
//! ```

mod error;
mod graph;
pub mod report;
mod result;
mod scheduler;

pub use error::ExecutorError;
pub use graph::{Edge, EdgeOptions, ExecutableGraph, VertexRef};
pub use result::{ExecutionResult, ExecutionSummary, VertexOutcome, VertexStatus, VertexSummary};
pub use xrayflow_graph::GraphError;
