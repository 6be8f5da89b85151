//! xrayflow Command
//!
//! Memoized asynchronous computations and the capabilities the scheduler
//! depends on.
//!
//! # Architecture
//!
//! ```text
//! Computable<T>      compute() -> shared future of Result<T, Failure>
//!      ▲
//!      │ implemented by
//! Command<B>         wraps a CommandBody; runs it at most once
//!      │ implements
//!      ▼
//! Executable         type-erased view driven by the executor
//! ```
//!
//! Bodies declare no dependencies themselves. They hold the commands they
//! read from and call `compute()` on them; the graph edges make sure those
//! have already settled by the time the body starts.
//!
//! # Usage
//!
//! ```ignore
//! use xrayflow_command::{Command, CommandError, ConstantCommand};
//!
//! let results = Arc::new(ConstantCommand::constant("results", json!({ "tests": [] })));
//! let input = results.clone();
//! let count = Arc::new(Command::from_fn("count tests", move || {
//!   let input = input.clone();
//!   async move {
//!     let results = input.compute().await?;
//!     Ok::<_, CommandError>(results["tests"].as_array().map_or(0, Vec::len))
//!   }
//! }));
//! ```

mod combine;
mod command;
mod computable;
mod constant;
mod destructure;
mod error;
mod fallback;
mod function;
mod state;

pub use combine::Combine;
pub use command::{Command, CommandBody};
pub use computable::{CommandId, Computable, Executable, Value};
pub use constant::{Constant, ConstantCommand};
pub use destructure::Destructure;
pub use error::{CommandError, Failure, cause_chain};
pub use fallback::Fallback;
pub use function::FnBody;
pub use state::ComputableState;
