//! The execution pass.
//!
//! Each pass walks the graph Kahn-style: a vertex is launched once every
//! predecessor has settled, and is skipped as soon as a required predecessor
//! failed or was skipped. Launched vertices run concurrently on a
//! [`JoinSet`]; the pass wakes up whenever one settles or the graph is edited.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;
use xrayflow_command::{CommandError, CommandId, ComputableState, Executable, Failure, Value};

use crate::graph::{ExecutableGraph, Registry};
use crate::result::{ExecutionResult, VertexOutcome, VertexStatus};

type Settlement = (CommandId, Result<Value, Failure>);

enum Progress {
  Running(Instant),
  Settled(VertexStatus, Option<Duration>),
}

enum Readiness {
  /// Some predecessor has not settled yet.
  Blocked,
  Ready,
  /// A required predecessor failed or was skipped.
  Skip(Failure),
}

impl<V: Executable + ?Sized> ExecutableGraph<V> {
  /// Run every vertex in dependency order and report what happened.
  ///
  /// Failures never escape: each vertex ends up succeeded, failed, or
  /// skipped in the returned [`ExecutionResult`]. Vertices and edges added
  /// while the pass is running are picked up until it completes.
  ///
  /// Running a second pass re-reads the memoized commands; nothing is
  /// computed twice.
  #[instrument(name = "graph_execute", skip(self), fields(execution_id))]
  pub async fn execute(&self) -> ExecutionResult {
    let execution_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("execution_id", execution_id.as_str());
    info!(
      execution_id = %execution_id,
      vertices = self.len(),
      "execution_started"
    );

    let mut pass = Pass::new(execution_id);
    let mut running: JoinSet<Settlement> = JoinSet::new();

    let result = loop {
      let launch = {
        let registry = self.lock();
        let launch = pass.advance(&registry);
        if launch.is_empty() && running.is_empty() {
          break pass.finish(&registry);
        }
        launch
      };

      for vertex in launch {
        pass.launch(&*vertex, &mut running);
      }

      tokio::select! {
        Some(joined) = running.join_next() => match joined {
          Ok((id, outcome)) => {
            pass.settle(&self.lock(), id, outcome);
          }
          Err(e) => {
            error!(error = %e, "vertex_task_lost");
          }
        },
        _ = self.changed().notified() => {}
      }
    };

    info!(
      execution_id = %result.execution_id(),
      succeeded = result.succeeded().count(),
      failed = result.failed().count(),
      skipped = result.skipped().count(),
      "execution_completed"
    );
    result
  }
}

/// Bookkeeping of one execution pass.
struct Pass {
  execution_id: String,
  progress: HashMap<CommandId, Progress>,
}

impl Pass {
  fn new(execution_id: String) -> Self {
    Self {
      execution_id,
      progress: HashMap::new(),
    }
  }

  /// Skip what can no longer run and collect what is ready to launch.
  ///
  /// Skips are applied until nothing changes, so a failure reaches the
  /// whole blocked subgraph in one call.
  fn advance<V: Executable + ?Sized>(&mut self, registry: &Registry<V>) -> Vec<Arc<V>> {
    let mut launch = Vec::new();
    loop {
      let mut skipped_any = false;
      for id in registry.graph.vertices() {
        if self.progress.contains_key(id) {
          continue;
        }
        let Some(vertex) = registry.vertices.get(id) else {
          continue;
        };

        match self.readiness(registry, id) {
          Readiness::Blocked => {}
          Readiness::Ready => {
            self.progress.insert(*id, Progress::Running(Instant::now()));
            launch.push(Arc::clone(vertex));
          }
          Readiness::Skip(cause) => match vertex.skip(cause) {
            Some(error) => {
              debug!(
                execution_id = %self.execution_id,
                vertex = %vertex.name(),
                cause = %error.root_cause(),
                "vertex_skipped"
              );
              self
                .progress
                .insert(*id, Progress::Settled(VertexStatus::Skipped(error), None));
              skipped_any = true;
            }
            // Already started (or settled) elsewhere: wait for its outcome.
            None => {
              self.progress.insert(*id, Progress::Running(Instant::now()));
              launch.push(Arc::clone(vertex));
            }
          },
        }
      }
      if !skipped_any {
        return launch;
      }
    }
  }

  fn readiness<V: ?Sized>(&self, registry: &Registry<V>, id: &CommandId) -> Readiness {
    let mut blocked = false;
    for (from, options) in registry.graph.incoming(id) {
      match self.progress.get(from) {
        Some(Progress::Settled(status, _)) => {
          if let (false, Some(error)) = (options.optional, status.error()) {
            return Readiness::Skip(Arc::clone(error));
          }
        }
        _ => blocked = true,
      }
    }
    if blocked {
      Readiness::Blocked
    } else {
      Readiness::Ready
    }
  }

  fn launch<V: Executable + ?Sized>(&self, vertex: &V, running: &mut JoinSet<Settlement>) {
    let id = vertex.id();
    let name = vertex.name().to_string();
    debug!(execution_id = %self.execution_id, vertex = %name, "vertex_started");

    let computation = vertex.execute();
    running.spawn(async move {
      let outcome = match AssertUnwindSafe(computation).catch_unwind().await {
        Ok(outcome) => outcome,
        // Commands catch their own panics; this covers other executables.
        Err(panic) => Err(Arc::new(CommandError::panicked(name, panic.as_ref()))),
      };
      (id, outcome)
    });
  }

  fn settle<V: Executable + ?Sized>(
    &mut self,
    registry: &Registry<V>,
    id: CommandId,
    outcome: Result<Value, Failure>,
  ) {
    let elapsed = match self.progress.get(&id) {
      Some(Progress::Running(started)) => Some(started.elapsed()),
      _ => None,
    };
    let vertex = registry.vertices.get(&id);
    let name = vertex.map(|v| v.name()).unwrap_or_default();
    let elapsed_ms = elapsed.unwrap_or_default().as_millis() as u64;

    let status = match outcome {
      Ok(value) => {
        debug!(execution_id = %self.execution_id, vertex = %name, elapsed_ms, "vertex_succeeded");
        VertexStatus::Succeeded(value)
      }
      // A command skipped by an earlier pass re-surfaces its skip.
      Err(error) if vertex.is_some_and(|v| v.state() == ComputableState::Skipped) => {
        debug!(execution_id = %self.execution_id, vertex = %name, "vertex_skipped");
        VertexStatus::Skipped(error)
      }
      Err(error) => {
        debug!(
          execution_id = %self.execution_id,
          vertex = %name,
          elapsed_ms,
          error = %error,
          "vertex_failed"
        );
        VertexStatus::Failed(error)
      }
    };
    self.progress.insert(id, Progress::Settled(status, elapsed));
  }

  fn finish<V: Executable + ?Sized>(mut self, registry: &Registry<V>) -> ExecutionResult {
    let outcomes = registry
      .graph
      .vertices()
      .iter()
      .filter_map(|id| {
        let vertex = registry.vertices.get(id)?;
        let (status, elapsed) = match self.progress.remove(id) {
          Some(Progress::Settled(status, elapsed)) => (status, elapsed),
          Some(Progress::Running(started)) => (
            VertexStatus::Failed(Arc::new(CommandError::failed("task was cancelled"))),
            Some(started.elapsed()),
          ),
          None => (
            VertexStatus::Failed(Arc::new(CommandError::failed("never scheduled"))),
            None,
          ),
        };
        Some(VertexOutcome {
          id: *id,
          name: vertex.name().to_string(),
          status,
          elapsed,
        })
      })
      .collect();
    ExecutionResult::new(self.execution_id, outcomes)
  }
}
