use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::command::CommandBody;
use crate::computable::Computable;
use crate::error::CommandError;

/// Fan-in over several inputs, keeping whatever succeeded.
///
/// Failed or skipped inputs are logged and dropped. If there were inputs and
/// none of them succeeded, the combination itself fails with
/// [`CommandError::AllInputsFailed`]. With no inputs at all the result is an
/// empty list.
pub struct Combine<T> {
  inputs: Vec<Arc<dyn Computable<T>>>,
}

impl<T> Combine<T> {
  pub fn new(inputs: Vec<Arc<dyn Computable<T>>>) -> Self {
    Self { inputs }
  }
}

impl<T: Clone + Send + Sync + 'static> CommandBody for Combine<T> {
  type Output = Vec<T>;

  async fn compute_result(&self) -> Result<Vec<T>, CommandError> {
    let outcomes = join_all(self.inputs.iter().map(|input| input.compute())).await;

    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
      match outcome {
        Ok(value) => values.push(value),
        Err(e) => {
          warn!(error = %e, "dropping failed input");
          failures.push(e);
        }
      }
    }

    if values.is_empty() && !failures.is_empty() {
      return Err(CommandError::AllInputsFailed { failures });
    }
    Ok(values)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::command::Command;
  use crate::constant::ConstantCommand;

  fn ok(value: u32) -> Arc<dyn Computable<u32>> {
    Arc::new(ConstantCommand::constant("ok", value))
  }

  fn failing(message: &str) -> Arc<dyn Computable<u32>> {
    Arc::new(ConstantCommand::<u32>::settled(
      "failing",
      Err(CommandError::failed(message)),
    ))
  }

  #[tokio::test]
  async fn test_keeps_successes_in_order() {
    let command = Command::new("combine", Combine::new(vec![ok(1), failing("x"), ok(3)]));
    assert_eq!(command.compute().await.unwrap(), vec![1, 3]);
  }

  #[tokio::test]
  async fn test_all_failed() {
    let command = Command::new("combine", Combine::new(vec![failing("a"), failing("b")]));
    let error = command.compute().await.unwrap_err();
    match error.as_ref() {
      CommandError::AllInputsFailed { failures } => assert_eq!(failures.len(), 2),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn test_no_inputs() {
    let command = Command::new("combine", Combine::<u32>::new(Vec::new()));
    assert!(command.compute().await.unwrap().is_empty());
  }
}
