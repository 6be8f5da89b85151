use serde::{Deserialize, Serialize};

/// Dependency between two steps: `to` reads `from`'s output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub from: String,
  pub to: String,
  /// When set, a failure of `from` does not skip `to`.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub optional: bool,
  /// Name under which `to` sees the input. Defaults to the step id of `from`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub slot: Option<String>,
}
