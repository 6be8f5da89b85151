//! Executor error types.

use xrayflow_graph::GraphError;

/// Errors raised around an execution pass.
///
/// Computation failures never show up here; they are recorded per vertex in
/// the [`ExecutionResult`](crate::ExecutionResult). These are the conditions
/// a caller turns into a hard stop.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
  /// The graph could not be wired.
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// None of the vertices a follow-up operation depends on succeeded.
  #[error("nothing to {what}")]
  NothingSucceeded { what: String, causes: Vec<String> },
}

impl ExecutorError {
  pub fn nothing_succeeded(what: impl Into<String>, causes: Vec<String>) -> Self {
    Self::NothingSucceeded {
      what: what.into(),
      causes,
    }
  }
}
