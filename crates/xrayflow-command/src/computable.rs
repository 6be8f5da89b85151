//! The capabilities the rest of the system depends on.
//!
//! [`Computable`] is what a command body reads its inputs through.
//! [`Executable`] is the type-erased view the scheduler drives; it never sees
//! concrete step types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::error::Failure;
use crate::state::ComputableState;

/// Type-erased successful output of an [`Executable`].
pub type Value = Arc<dyn Any + Send + Sync>;

/// Identity of a command. Two commands never share an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(Uuid);

impl CommandId {
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for CommandId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for CommandId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// A value that can be asked for any number of times but is produced at most once.
///
/// Callers that ask while the computation is in flight share it. Callers that
/// ask after it settled get the cached value, or the very same failure.
pub trait Computable<T>: Send + Sync {
  fn compute(&self) -> BoxFuture<'static, Result<T, Failure>>;
}

/// A schedulable unit of work, as seen by the executor.
pub trait Executable: Send + Sync {
  fn id(&self) -> CommandId;

  /// Human-readable name used in logs and cause chains.
  fn name(&self) -> &str;

  fn state(&self) -> ComputableState;

  /// Compute (or re-read) the outcome with the value type erased.
  fn execute(&self) -> BoxFuture<'static, Result<Value, Failure>>;

  /// Mark a command that was never started as skipped.
  ///
  /// Returns the error later readers of the command will observe, or `None`
  /// if the command had already been started.
  fn skip(&self, cause: Failure) -> Option<Failure>;
}

impl<T: Executable + ?Sized> Executable for Arc<T> {
  fn id(&self) -> CommandId {
    (**self).id()
  }

  fn name(&self) -> &str {
    (**self).name()
  }

  fn state(&self) -> ComputableState {
    (**self).state()
  }

  fn execute(&self) -> BoxFuture<'static, Result<Value, Failure>> {
    (**self).execute()
  }

  fn skip(&self, cause: Failure) -> Option<Failure> {
    (**self).skip(cause)
  }
}
