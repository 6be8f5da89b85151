//! Command lifecycle.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Where a command is in its lifecycle.
///
/// `Pending -> Running -> {Succeeded | Failed}`, or `Pending -> Skipped` when
/// a required dependency did not succeed. The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputableState {
  Pending,
  Running,
  Succeeded,
  Failed,
  Skipped,
}

impl ComputableState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
  }
}

impl fmt::Display for ComputableState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Pending => "pending",
      Self::Running => "running",
      Self::Succeeded => "succeeded",
      Self::Failed => "failed",
      Self::Skipped => "skipped",
    };
    f.write_str(name)
  }
}

/// State plus timestamps, kept for diagnostics.
#[derive(Debug)]
pub(crate) struct Lifecycle {
  pub(crate) state: ComputableState,
  started_at: Option<Instant>,
  finished_at: Option<Instant>,
}

impl Lifecycle {
  pub(crate) fn new() -> Self {
    Self {
      state: ComputableState::Pending,
      started_at: None,
      finished_at: None,
    }
  }

  pub(crate) fn begin(&mut self) {
    self.state = ComputableState::Running;
    self.started_at = Some(Instant::now());
  }

  pub(crate) fn settle(&mut self, succeeded: bool) {
    self.state = if succeeded {
      ComputableState::Succeeded
    } else {
      ComputableState::Failed
    };
    self.finished_at = Some(Instant::now());
  }

  pub(crate) fn skip(&mut self) {
    self.state = ComputableState::Skipped;
    self.finished_at = Some(Instant::now());
  }

  /// Time spent running: up to now while running, up to settlement afterwards.
  pub(crate) fn elapsed(&self) -> Option<Duration> {
    let started = self.started_at?;
    Some(
      self
        .finished_at
        .unwrap_or_else(Instant::now)
        .saturating_duration_since(started),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_transitions() {
    let mut lifecycle = Lifecycle::new();
    assert_eq!(lifecycle.state, ComputableState::Pending);
    assert!(lifecycle.elapsed().is_none());

    lifecycle.begin();
    assert_eq!(lifecycle.state, ComputableState::Running);
    assert!(!lifecycle.state.is_terminal());

    lifecycle.settle(false);
    assert_eq!(lifecycle.state, ComputableState::Failed);
    assert!(lifecycle.state.is_terminal());
    assert!(lifecycle.elapsed().is_some());
  }

  #[test]
  fn test_skipped_has_no_run_time() {
    let mut lifecycle = Lifecycle::new();
    lifecycle.skip();
    assert_eq!(lifecycle.state, ComputableState::Skipped);
    assert!(lifecycle.elapsed().is_none());
  }

  #[test]
  fn test_state_serializes_snake_case() {
    let json = serde_json::to_string(&ComputableState::Succeeded).unwrap();
    assert_eq!(json, "\"succeeded\"");
    assert_eq!(ComputableState::Skipped.to_string(), "skipped");
  }
}
