//! Turning an [`ExecutionResult`] into warnings and escalations.
//!
//! The scheduler never decides whether a failure is fatal. Callers use these
//! helpers to report partial failures and to stop a follow-up operation when
//! everything it needs is missing.

use tracing::warn;
use xrayflow_command::{CommandError, cause_chain};

use crate::error::ExecutorError;
use crate::graph::VertexRef;
use crate::result::{ExecutionResult, VertexStatus};

/// Render an error with everything behind it on one line.
///
/// `skipping import. Caused by: skipping convert. Caused by: 503 from jira`
pub fn describe(error: &CommandError) -> String {
  cause_chain(error).join(". Caused by: ")
}

/// Log one warning per failed or skipped vertex.
pub fn log_outcomes(result: &ExecutionResult) {
  for outcome in result.outcomes() {
    match &outcome.status {
      VertexStatus::Succeeded(_) => {}
      VertexStatus::Failed(error) => warn!(
        execution_id = %result.execution_id(),
        vertex = %outcome.name,
        error = %describe(error),
        "vertex_failed"
      ),
      VertexStatus::Skipped(cause) => warn!(
        execution_id = %result.execution_id(),
        vertex = %outcome.name,
        cause = %describe(cause),
        "vertex_skipped"
      ),
    }
  }
}

/// Fail unless at least one of `vertices` succeeded.
///
/// `what` names the operation that would have consumed them, e.g. `"import"`
/// gives "nothing to import". The error lists every cause. Vertices that are
/// not part of the result count as not succeeded.
pub fn require_any_succeeded<R: VertexRef>(
  result: &ExecutionResult,
  vertices: impl IntoIterator<Item = R>,
  what: &str,
) -> Result<(), ExecutorError> {
  let mut causes = Vec::new();
  for vertex in vertices {
    let id = vertex.vertex_id();
    match result.get(id).map(|outcome| (&outcome.name, &outcome.status)) {
      Some((_, VertexStatus::Succeeded(_))) => return Ok(()),
      Some((name, VertexStatus::Failed(error) | VertexStatus::Skipped(error))) => {
        causes.push(format!("{name}: {}", describe(error)));
      }
      None => causes.push(format!("{id}: not executed")),
    }
  }
  Err(ExecutorError::nothing_succeeded(what, causes))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use xrayflow_command::{CommandId, Failure};

  use super::*;
  use crate::result::VertexOutcome;

  fn outcome(name: &str, status: VertexStatus) -> VertexOutcome {
    VertexOutcome {
      id: CommandId::new(),
      name: name.to_string(),
      status,
      elapsed: None,
    }
  }

  fn failure(message: &str) -> Failure {
    Arc::new(CommandError::failed(message))
  }

  #[test]
  fn test_describe_skip_chain() {
    let root = failure("503 from jira");
    let convert = Arc::new(CommandError::Skipped {
      command: "convert".to_string(),
      cause: root,
    });
    let import = CommandError::Skipped {
      command: "import".to_string(),
      cause: convert,
    };

    assert_eq!(
      describe(&import),
      "skipping import. Caused by: skipping convert. Caused by: 503 from jira"
    );
  }

  #[test]
  fn test_require_any_succeeded() {
    let result = ExecutionResult::new(
      "exec".to_string(),
      vec![
        outcome("first", VertexStatus::Failed(failure("bad json"))),
        outcome("second", VertexStatus::Succeeded(Arc::new(()))),
      ],
    );
    let ids: Vec<CommandId> = result.outcomes().iter().map(|o| o.id).collect();

    assert!(require_any_succeeded(&result, ids.clone(), "import").is_ok());

    let err = require_any_succeeded(&result, [ids[0]], "import").unwrap_err();
    assert_eq!(err.to_string(), "nothing to import");
    match err {
      ExecutorError::NothingSucceeded { causes, .. } => {
        assert_eq!(causes, vec!["first: bad json".to_string()]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_require_any_succeeded_with_nothing_listed() {
    let result = ExecutionResult::new("exec".to_string(), Vec::new());
    let err = require_any_succeeded(&result, Vec::<CommandId>::new(), "upload").unwrap_err();
    assert!(matches!(
      err,
      ExecutorError::NothingSucceeded { ref causes, .. } if causes.is_empty()
    ));
  }
}
