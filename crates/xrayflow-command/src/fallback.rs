use std::sync::Arc;

use tracing::warn;

use crate::command::CommandBody;
use crate::computable::Computable;
use crate::error::CommandError;

/// Yields its input's value, or a fallback when the input failed or was skipped.
///
/// Meant to sit behind an optional edge: the input's failure becomes "value
/// absent" instead of blocking everything downstream.
pub struct Fallback<T> {
  input: Arc<dyn Computable<T>>,
  fallback: T,
}

impl<T> Fallback<T> {
  pub fn new(input: Arc<dyn Computable<T>>, fallback: T) -> Self {
    Self { input, fallback }
  }
}

impl<T: Clone + Send + Sync + 'static> CommandBody for Fallback<T> {
  type Output = T;

  async fn compute_result(&self) -> Result<T, CommandError> {
    match self.input.compute().await {
      Ok(value) => Ok(value),
      Err(e) => {
        warn!(error = %e.root_cause(), "input unavailable, using fallback value");
        Ok(self.fallback.clone())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::command::Command;
  use crate::constant::ConstantCommand;

  #[tokio::test]
  async fn test_passes_value_through() {
    let input = Arc::new(ConstantCommand::constant("input", "real".to_string()));
    let command = Command::new("fallback", Fallback::new(input, "fallback".to_string()));
    assert_eq!(command.compute().await.unwrap(), "real");
  }

  #[tokio::test]
  async fn test_uses_fallback_on_failure() {
    let input: Arc<ConstantCommand<String>> = Arc::new(ConstantCommand::settled(
      "input",
      Err(CommandError::failed("boom")),
    ));
    let command = Command::new("fallback", Fallback::new(input, "fallback".to_string()));
    assert_eq!(command.compute().await.unwrap(), "fallback");
  }
}
