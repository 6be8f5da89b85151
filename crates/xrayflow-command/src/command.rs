//! Memoized commands.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared, TryFutureExt};
use tracing::debug;

use crate::computable::{CommandId, Computable, Executable, Value};
use crate::error::{CommandError, Failure};
use crate::state::{ComputableState, Lifecycle};

/// The computation behind a [`Command`].
///
/// A body reads its inputs by calling `compute()` on the commands it holds.
/// Those dependencies must also be connected in the graph so the scheduler
/// runs things in the right order.
pub trait CommandBody: Send + Sync + 'static {
  type Output: Clone + Send + Sync + 'static;

  fn compute_result(&self) -> impl Future<Output = Result<Self::Output, CommandError>> + Send;
}

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T, Failure>>>;

/// A [`CommandBody`] wrapped with compute-once semantics and lifecycle tracking.
///
/// The first `compute()` call starts the body; every other call, concurrent or
/// later, observes that single run. Failures are stored as a [`Failure`] so
/// all readers see the same error instance.
pub struct Command<B: CommandBody> {
  id: CommandId,
  name: String,
  body: Arc<B>,
  outcome: Mutex<Option<SharedOutcome<B::Output>>>,
  lifecycle: Arc<Mutex<Lifecycle>>,
}

impl<B: CommandBody> Command<B> {
  pub fn new(name: impl Into<String>, body: B) -> Self {
    Self {
      id: CommandId::new(),
      name: name.into(),
      body: Arc::new(body),
      outcome: Mutex::new(None),
      lifecycle: Arc::new(Mutex::new(Lifecycle::new())),
    }
  }

  pub fn id(&self) -> CommandId {
    self.id
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn body(&self) -> &B {
    &self.body
  }

  pub fn state(&self) -> ComputableState {
    lock(&self.lifecycle).state
  }

  /// How long the body ran, if it was started.
  pub fn elapsed(&self) -> Option<Duration> {
    lock(&self.lifecycle).elapsed()
  }

  /// Produce the command's outcome, starting the body on the first call.
  pub fn compute(&self) -> BoxFuture<'static, Result<B::Output, Failure>> {
    let shared = {
      let mut outcome = lock(&self.outcome);
      outcome.get_or_insert_with(|| self.start()).clone()
    };
    shared.boxed()
  }

  /// Mark the command skipped if it has not been started yet.
  ///
  /// A skipped command never runs its body; `compute()` resolves to
  /// [`CommandError::Skipped`] carrying `cause`.
  pub fn skip(&self, cause: Failure) -> bool {
    self.skip_with(cause).is_some()
  }

  fn skip_with(&self, cause: Failure) -> Option<Failure> {
    let mut outcome = lock(&self.outcome);
    if outcome.is_some() {
      return None;
    }

    let error = Arc::new(CommandError::Skipped {
      command: self.name.clone(),
      cause,
    });
    lock(&self.lifecycle).skip();
    debug!(command = %self.name, id = %self.id, "command_skipped");

    let skipped: BoxFuture<'static, Result<B::Output, Failure>> =
      future::ready(Err(error.clone())).boxed();
    *outcome = Some(skipped.shared());
    Some(error)
  }

  fn start(&self) -> SharedOutcome<B::Output> {
    lock(&self.lifecycle).begin();
    debug!(command = %self.name, id = %self.id, "command_started");

    let body = Arc::clone(&self.body);
    let lifecycle = Arc::clone(&self.lifecycle);
    let name = self.name.clone();

    let run: BoxFuture<'static, Result<B::Output, Failure>> = async move {
      let result = match AssertUnwindSafe(body.compute_result()).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(CommandError::panicked(name.as_str(), panic.as_ref())),
      }
      .map_err(Arc::new);
      {
        let mut lifecycle = lock(&lifecycle);
        lifecycle.settle(result.is_ok());
        let elapsed_ms = lifecycle.elapsed().unwrap_or_default().as_millis() as u64;
        match &result {
          Ok(_) => debug!(command = %name, elapsed_ms, "command_succeeded"),
          Err(e) => debug!(command = %name, elapsed_ms, error = %e, "command_failed"),
        }
      }
      result
    }
    .boxed();

    run.shared()
  }
}

impl<B: CommandBody> Computable<B::Output> for Command<B> {
  fn compute(&self) -> BoxFuture<'static, Result<B::Output, Failure>> {
    Command::compute(self)
  }
}

impl<B: CommandBody> Executable for Command<B> {
  fn id(&self) -> CommandId {
    self.id
  }

  fn name(&self) -> &str {
    &self.name
  }

  fn state(&self) -> ComputableState {
    Command::state(self)
  }

  fn execute(&self) -> BoxFuture<'static, Result<Value, Failure>> {
    Command::compute(self)
      .map_ok(|value| Arc::new(value) as Value)
      .boxed()
  }

  fn skip(&self, cause: Failure) -> Option<Failure> {
    self.skip_with(cause)
  }
}

impl<B: CommandBody> fmt::Debug for Command<B> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Command")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("state", &self.state())
      .finish()
  }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(|e| e.into_inner())
}
