use std::future::Future;

use crate::command::{Command, CommandBody};
use crate::error::CommandError;

/// Body backed by a closure that builds a fresh future.
///
/// The closure is only ever called once per command, since the command
/// memoizes its outcome.
pub struct FnBody<F> {
  f: F,
}

impl<F, Fut, T> CommandBody for FnBody<F>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, CommandError>> + Send + 'static,
  T: Clone + Send + Sync + 'static,
{
  type Output = T;

  fn compute_result(&self) -> impl Future<Output = Result<T, CommandError>> + Send {
    (self.f)()
  }
}

impl<F, Fut, T> Command<FnBody<F>>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, CommandError>> + Send + 'static,
  T: Clone + Send + Sync + 'static,
{
  pub fn from_fn(name: impl Into<String>, f: F) -> Self {
    Command::new(name, FnBody { f })
  }
}
