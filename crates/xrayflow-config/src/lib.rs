//! xrayflow Config
//!
//! Serializable pipeline definitions. A pipeline is a list of steps and the
//! dependency edges between them; the pipeline crate turns it into an
//! executable graph of commands.
//!
//! Definitions are loaded from JSON files by the CLI.

mod edge;
mod input;
mod pipeline;
mod step;

pub use edge::EdgeDef;
pub use input::InputValue;
pub use pipeline::PipelineDef;
pub use step::{StepDef, StepKind};
