use serde::{Deserialize, Serialize};

use crate::edge::EdgeDef;
use crate::step::StepDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
  pub name: String,
  pub steps: Vec<StepDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}

impl PipelineDef {
  pub fn step(&self, step_id: &str) -> Option<&StepDef> {
    self.steps.iter().find(|step| step.step_id == step_id)
  }
}
