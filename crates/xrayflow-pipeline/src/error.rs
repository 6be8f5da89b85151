//! Pipeline error types.

use std::path::PathBuf;

use xrayflow_graph::GraphError;

/// Errors raised while loading or building a pipeline, or resolving a step's inputs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
  #[error("failed to read pipeline {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse pipeline {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("duplicate step '{step_id}'")]
  DuplicateStep { step_id: String },

  #[error("edge {from} -> {to} references unknown step '{step_id}'")]
  UnknownStep {
    from: String,
    to: String,
    step_id: String,
  },

  #[error("step '{step_id}' has two inputs named '{slot}'")]
  DuplicateSlot { step_id: String, slot: String },

  #[error("step '{step_id}' expects {expected} input(s), got {actual}")]
  InputCount {
    step_id: String,
    expected: usize,
    actual: usize,
  },

  /// Template rendering or schema coercion failed.
  #[error("input resolution failed for step '{step_id}': {message}")]
  InputResolution { step_id: String, message: String },

  #[error("invalid pipeline graph: {0}")]
  Graph(#[from] GraphError),
}

impl PipelineError {
  pub(crate) fn input_resolution(step_id: &str, message: impl Into<String>) -> Self {
    Self::InputResolution {
      step_id: step_id.to_string(),
      message: message.into(),
    }
  }
}
