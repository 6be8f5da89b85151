//! Execution result types.

use std::any::Any;
use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xrayflow_command::{CommandId, ComputableState, Failure, Value, cause_chain};

use crate::graph::VertexRef;

/// Terminal status of a vertex after a pass.
#[derive(Debug, Clone)]
pub enum VertexStatus {
  Succeeded(Value),
  /// The vertex ran and failed with its own error.
  Failed(Failure),
  /// The vertex never ran because a required dependency did not succeed.
  Skipped(Failure),
}

impl VertexStatus {
  pub fn state(&self) -> ComputableState {
    match self {
      Self::Succeeded(_) => ComputableState::Succeeded,
      Self::Failed(_) => ComputableState::Failed,
      Self::Skipped(_) => ComputableState::Skipped,
    }
  }

  pub fn value(&self) -> Option<&Value> {
    match self {
      Self::Succeeded(value) => Some(value),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&Failure> {
    match self {
      Self::Succeeded(_) => None,
      Self::Failed(error) | Self::Skipped(error) => Some(error),
    }
  }
}

/// Outcome of a single vertex.
#[derive(Debug, Clone)]
pub struct VertexOutcome {
  pub id: CommandId,
  pub name: String,
  pub status: VertexStatus,
  /// Time from launch to settlement. `None` for skipped vertices.
  pub elapsed: Option<Duration>,
}

impl VertexOutcome {
  /// The successful value, if it is a `T`.
  pub fn value<T: Any>(&self) -> Option<&T> {
    let value = self.status.value()?;
    (**value).downcast_ref::<T>()
  }
}

/// Result of one [`execute`](crate::ExecutableGraph::execute) pass.
///
/// Outcomes are listed in placement order.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
  execution_id: String,
  outcomes: Vec<VertexOutcome>,
  index: HashMap<CommandId, usize>,
}

impl ExecutionResult {
  pub(crate) fn new(execution_id: String, outcomes: Vec<VertexOutcome>) -> Self {
    let index = outcomes
      .iter()
      .enumerate()
      .map(|(i, outcome)| (outcome.id, i))
      .collect();
    Self {
      execution_id,
      outcomes,
      index,
    }
  }

  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn outcomes(&self) -> &[VertexOutcome] {
    &self.outcomes
  }

  pub fn len(&self) -> usize {
    self.outcomes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outcomes.is_empty()
  }

  pub fn get(&self, vertex: impl VertexRef) -> Option<&VertexOutcome> {
    self
      .index
      .get(&vertex.vertex_id())
      .map(|i| &self.outcomes[*i])
  }

  pub fn status(&self, vertex: impl VertexRef) -> Option<ComputableState> {
    self.get(vertex).map(|outcome| outcome.status.state())
  }

  pub fn value<T: Any>(&self, vertex: impl VertexRef) -> Option<&T> {
    self.get(vertex)?.value::<T>()
  }

  pub fn error(&self, vertex: impl VertexRef) -> Option<&Failure> {
    self.get(vertex)?.status.error()
  }

  pub fn succeeded(&self) -> impl Iterator<Item = &VertexOutcome> {
    self.with_state(ComputableState::Succeeded)
  }

  pub fn failed(&self) -> impl Iterator<Item = &VertexOutcome> {
    self.with_state(ComputableState::Failed)
  }

  pub fn skipped(&self) -> impl Iterator<Item = &VertexOutcome> {
    self.with_state(ComputableState::Skipped)
  }

  /// Whether every vertex succeeded.
  pub fn is_success(&self) -> bool {
    self
      .outcomes
      .iter()
      .all(|outcome| matches!(outcome.status, VertexStatus::Succeeded(_)))
  }

  /// Serializable view of the result.
  ///
  /// Values are included when they are JSON; other value types are opaque.
  pub fn summary(&self) -> ExecutionSummary {
    let vertices: Vec<VertexSummary> = self.outcomes.iter().map(VertexSummary::from).collect();
    let count = |state| vertices.iter().filter(|v| v.state == state).count();
    ExecutionSummary {
      execution_id: self.execution_id.clone(),
      succeeded: count(ComputableState::Succeeded),
      failed: count(ComputableState::Failed),
      skipped: count(ComputableState::Skipped),
      vertices,
    }
  }

  fn with_state(&self, state: ComputableState) -> impl Iterator<Item = &VertexOutcome> {
    self
      .outcomes
      .iter()
      .filter(move |outcome| outcome.status.state() == state)
  }
}

/// Serializable summary of an execution pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionSummary {
  pub execution_id: String,
  pub succeeded: usize,
  pub failed: usize,
  pub skipped: usize,
  pub vertices: Vec<VertexSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexSummary {
  pub id: String,
  pub name: String,
  pub state: ComputableState,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub elapsed_ms: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub output: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  /// Everything behind `error`, outermost first.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub causes: Vec<String>,
}

impl From<&VertexOutcome> for VertexSummary {
  fn from(outcome: &VertexOutcome) -> Self {
    let (error, causes) = match outcome.status.error() {
      Some(error) => {
        let mut chain = cause_chain(&**error).into_iter();
        (chain.next(), chain.collect())
      }
      None => (None, Vec::new()),
    };
    Self {
      id: outcome.id.to_string(),
      name: outcome.name.clone(),
      state: outcome.status.state(),
      elapsed_ms: outcome.elapsed.map(|d| d.as_millis() as u64),
      output: outcome.value::<serde_json::Value>().cloned(),
      error,
      causes,
    }
  }
}
