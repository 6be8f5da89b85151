use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::input::InputValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  pub step_id: String,
  #[serde(flatten)]
  pub kind: StepKind,
  /// Wait this long before computing.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub delay_ms: Option<u64>,
  /// Give up on the step after this long; it then fails with a timeout.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
  /// Yields a fixed value.
  Constant { value: serde_json::Value },
  /// Always fails with `message`.
  Fail { message: String },
  /// Renders `inputs` against the upstream data, keyed by slot.
  Template {
    #[serde(default)]
    inputs: HashMap<String, InputValue>,
    /// JSON schema whose property types drive coercion of rendered values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<serde_json::Value>,
  },
  /// Yields one field of its single input. A leading `/` selects a JSON pointer.
  Pick { field: String },
  /// Collects the outputs of every input that succeeded into an array.
  Merge,
  /// Yields its input, or `value` when the input failed or was skipped.
  Fallback { value: serde_json::Value },
}
