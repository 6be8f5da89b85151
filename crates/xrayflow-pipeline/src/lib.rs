//! xrayflow Pipeline
//!
//! Turns a [`PipelineDef`](xrayflow_config::PipelineDef) into an
//! [`ExecutableGraph`](xrayflow_executor::ExecutableGraph) of commands.
//!
//! Each step becomes one [`PipelineStep`] whose body reads its upstream
//! steps through their commands:
//!
//! | kind | output |
//! |---|---|
//! | `constant` | the configured value |
//! | `fail` | always fails |
//! | `template` | rendered and schema-coerced inputs, see [`template`] |
//! | `pick` | one field of the single input |
//! | `merge` | array of every input that succeeded |
//! | `fallback` | the single input, or the configured value if it failed |
//!
//! `delay_ms` and `timeout_ms` apply to every kind; a step that runs past its
//! timeout fails like any other step.

mod error;
mod pipeline;
mod step;
pub mod template;

pub use error::PipelineError;
pub use pipeline::{Pipeline, load_definition};
pub use step::{PipelineStep, StepBody};
