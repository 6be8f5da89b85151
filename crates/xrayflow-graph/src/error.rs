use thiserror::Error;

/// Configuration errors raised while building a graph.
///
/// These are fatal to graph construction: the caller has to fix the wiring
/// before anything is executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("vertex not found: {0}")]
  VertexNotFound(String),

  #[error("a different vertex is already registered as {0}")]
  DuplicateVertex(String),

  #[error("edge {from} -> {to} would create a cycle")]
  CycleDetected { from: String, to: String },

  #[error("edge {from} -> {to} already exists with different options")]
  ConflictingEdge { from: String, to: String },
}

impl GraphError {
  pub fn vertex_not_found(vertex: impl ToString) -> Self {
    Self::VertexNotFound(vertex.to_string())
  }

  pub fn cycle(from: impl ToString, to: impl ToString) -> Self {
    Self::CycleDetected {
      from: from.to_string(),
      to: to.to_string(),
    }
  }
}
