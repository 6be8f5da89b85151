//! Command failure types.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// A settled failure, shared by every reader of the command that produced it.
pub type Failure = Arc<CommandError>;

/// Errors produced while computing a command.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The command body gave up with a message.
  #[error("{message}")]
  Failed { message: String },

  /// The command body failed because of an underlying error.
  #[error("{message}")]
  Source {
    message: String,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
  },

  /// The command body did not settle in time.
  #[error("timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The command was never attempted because a required dependency did not succeed.
  #[error("skipping {command}")]
  Skipped {
    command: String,
    #[source]
    cause: Failure,
  },

  /// Every input of a fan-in command failed.
  #[error("all {} inputs failed", .failures.len())]
  AllInputsFailed { failures: Vec<Failure> },

  /// The command body panicked.
  #[error("{command} panicked: {message}")]
  Panicked { command: String, message: String },

  /// A structured input lacked the requested field.
  #[error("missing field '{field}'")]
  MissingField { field: String },

  /// A dependency's failure, re-surfaced unchanged.
  #[error(transparent)]
  Upstream(#[from] Failure),
}

impl CommandError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }

  pub fn with_source(
    message: impl Into<String>,
    source: impl StdError + Send + Sync + 'static,
  ) -> Self {
    Self::Source {
      message: message.into(),
      source: Box::new(source),
    }
  }

  /// Turn a panic payload caught while running `command` into an error.
  pub fn panicked(command: impl Into<String>, payload: &(dyn Any + Send)) -> Self {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
      message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
      message.clone()
    } else {
      "unknown panic".to_string()
    };
    Self::Panicked {
      command: command.into(),
      message,
    }
  }

  pub fn is_skipped(&self) -> bool {
    match self {
      Self::Skipped { .. } => true,
      Self::Upstream(inner) => inner.is_skipped(),
      _ => false,
    }
  }

  /// The failure that started the chain, following skips and re-surfaced
  /// dependency failures back to the command that actually failed.
  pub fn root_cause(self: &Arc<Self>) -> Failure {
    match self.as_ref() {
      Self::Skipped { cause, .. } => cause.root_cause(),
      Self::Upstream(inner) => inner.root_cause(),
      _ => Arc::clone(self),
    }
  }
}

/// Render an error and all of its sources, outermost first.
pub fn cause_chain(error: &(dyn StdError + 'static)) -> Vec<String> {
  let mut chain = vec![error.to_string()];
  let mut current = error.source();
  while let Some(source) = current {
    let message = source.to_string();
    // Transparent wrappers repeat their inner message.
    if chain.last() != Some(&message) {
      chain.push(message);
    }
    current = source.source();
  }
  chain
}
