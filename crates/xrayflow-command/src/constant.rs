//! Commands preloaded with a known outcome.

use crate::command::{Command, CommandBody};
use crate::error::{CommandError, Failure};

/// Body that resolves to a value it already holds.
///
/// Used to feed externally obtained data (a parsed document, a pre-fetched
/// response) into the graph behind the same interface as computed data.
#[derive(Debug, Clone)]
pub struct Constant<T> {
  outcome: Result<T, Failure>,
}

impl<T> Constant<T> {
  pub fn new(value: T) -> Self {
    Self { outcome: Ok(value) }
  }

  /// A constant that was obtained as an already-settled result.
  pub fn settled(outcome: Result<T, CommandError>) -> Self {
    Self {
      outcome: outcome.map_err(Failure::new),
    }
  }
}

impl<T: Clone + Send + Sync + 'static> CommandBody for Constant<T> {
  type Output = T;

  async fn compute_result(&self) -> Result<T, CommandError> {
    self.outcome.clone().map_err(CommandError::Upstream)
  }
}

pub type ConstantCommand<T> = Command<Constant<T>>;

impl<T: Clone + Send + Sync + 'static> Command<Constant<T>> {
  pub fn constant(name: impl Into<String>, value: T) -> Self {
    Command::new(name, Constant::new(value))
  }

  pub fn settled(name: impl Into<String>, outcome: Result<T, CommandError>) -> Self {
    Command::new(name, Constant::settled(outcome))
  }
}
