use std::sync::Arc;

use crate::command::CommandBody;
use crate::computable::Computable;
use crate::error::CommandError;

/// Picks one field out of a JSON input.
///
/// `field` is either a plain key or a JSON pointer starting with `/`.
pub struct Destructure {
  input: Arc<dyn Computable<serde_json::Value>>,
  field: String,
}

impl Destructure {
  pub fn new(input: Arc<dyn Computable<serde_json::Value>>, field: impl Into<String>) -> Self {
    Self {
      input,
      field: field.into(),
    }
  }
}

impl CommandBody for Destructure {
  type Output = serde_json::Value;

  async fn compute_result(&self) -> Result<serde_json::Value, CommandError> {
    let value = self.input.compute().await?;
    let picked = if self.field.starts_with('/') {
      value.pointer(&self.field)
    } else {
      value.get(&self.field)
    };
    picked.cloned().ok_or_else(|| CommandError::MissingField {
      field: self.field.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::command::Command;
  use crate::constant::ConstantCommand;

  fn document() -> Arc<dyn Computable<serde_json::Value>> {
    Arc::new(ConstantCommand::constant(
      "document",
      json!({ "info": { "summary": "run 1" }, "tests": [1, 2] }),
    ))
  }

  #[tokio::test]
  async fn test_plain_key() {
    let command = Command::new("tests", Destructure::new(document(), "tests"));
    assert_eq!(command.compute().await.unwrap(), json!([1, 2]));
  }

  #[tokio::test]
  async fn test_pointer() {
    let command = Command::new("summary", Destructure::new(document(), "/info/summary"));
    assert_eq!(command.compute().await.unwrap(), json!("run 1"));
  }

  #[tokio::test]
  async fn test_missing_field() {
    let command = Command::new("missing", Destructure::new(document(), "evidence"));
    let error = command.compute().await.unwrap_err();
    assert!(matches!(error.as_ref(), CommandError::MissingField { field } if field == "evidence"));
  }
}
