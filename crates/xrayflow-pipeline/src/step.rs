//! Step bodies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tracing::debug;
use xrayflow_command::{
  Combine, Command, CommandBody, CommandError, Computable, Constant, Destructure, Fallback,
};
use xrayflow_config::{StepDef, StepKind};

use crate::error::PipelineError;
use crate::template::{self, SchemaType};

/// A pipeline step as placed in the graph.
pub type PipelineStep = Command<StepBody>;

/// One upstream dependency of a step.
pub(crate) struct Input {
  pub(crate) slot: String,
  pub(crate) optional: bool,
  pub(crate) source: Arc<dyn Computable<Value>>,
}

enum Action {
  Constant(Constant<Value>),
  Fail(String),
  Template {
    templates: HashMap<String, String>,
    schema: HashMap<String, SchemaType>,
  },
  Pick(Destructure),
  Merge(Combine<Value>),
  Fallback(Fallback<Value>),
}

/// The body of a [`PipelineStep`]: what the step does, plus its delay and timeout.
pub struct StepBody {
  step_id: String,
  action: Action,
  inputs: Vec<Input>,
  delay: Option<Duration>,
  timeout: Option<Duration>,
}

impl StepBody {
  pub(crate) fn new(def: &StepDef, mut inputs: Vec<Input>) -> Result<Self, PipelineError> {
    let step_id = def.step_id.as_str();
    let action = match &def.kind {
      StepKind::Constant { value } => Action::Constant(Constant::new(value.clone())),
      StepKind::Fail { message } => Action::Fail(message.clone()),
      StepKind::Template {
        inputs: templates,
        schema,
      } => Action::Template {
        templates: templates.clone(),
        schema: schema
          .as_ref()
          .map(template::extract_schema_types)
          .unwrap_or_default(),
      },
      StepKind::Pick { field } => {
        Action::Pick(Destructure::new(single_input(step_id, &inputs)?, field.clone()))
      }
      StepKind::Merge => Action::Merge(Combine::new(
        inputs.iter().map(|input| Arc::clone(&input.source)).collect(),
      )),
      StepKind::Fallback { value } => {
        Action::Fallback(Fallback::new(single_input(step_id, &inputs)?, value.clone()))
      }
    };

    // Only templates read their inputs by slot.
    if !matches!(action, Action::Template { .. }) {
      inputs.clear();
    }

    Ok(Self {
      step_id: def.step_id.clone(),
      action,
      inputs,
      delay: def.delay_ms.map(Duration::from_millis),
      timeout: def.timeout_ms.map(Duration::from_millis),
    })
  }

  pub fn step_id(&self) -> &str {
    &self.step_id
  }

  async fn run(&self) -> Result<Value, CommandError> {
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }

    match &self.action {
      Action::Constant(constant) => constant.compute_result().await,
      Action::Fail(message) => Err(CommandError::failed(message.clone())),
      Action::Template { templates, schema } => {
        let upstream = self.gather().await?;
        let context = template::build_context(&upstream);
        template::render_inputs(&self.step_id, templates, &context)
          .and_then(|rendered| template::coerce_inputs(&self.step_id, &rendered, schema))
          .map_err(|e| CommandError::with_source("could not resolve inputs", e))
      }
      Action::Pick(pick) => pick.compute_result().await,
      Action::Merge(merge) => merge.compute_result().await.map(Value::Array),
      Action::Fallback(fallback) => fallback.compute_result().await,
    }
  }

  /// Read every input. Failed optional inputs are left out.
  async fn gather(&self) -> Result<Vec<(String, Value)>, CommandError> {
    let outcomes = join_all(self.inputs.iter().map(|input| input.source.compute())).await;

    let mut upstream = Vec::with_capacity(outcomes.len());
    for (input, outcome) in self.inputs.iter().zip(outcomes) {
      match outcome {
        Ok(value) => upstream.push((input.slot.clone(), value)),
        Err(e) if input.optional => {
          debug!(step_id = %self.step_id, slot = %input.slot, error = %e, "optional_input_absent");
        }
        Err(e) => return Err(CommandError::Upstream(e)),
      }
    }
    Ok(upstream)
  }
}

impl CommandBody for StepBody {
  type Output = Value;

  async fn compute_result(&self) -> Result<Value, CommandError> {
    match self.timeout {
      Some(timeout) => tokio::time::timeout(timeout, self.run())
        .await
        .map_err(|_| CommandError::Timeout {
          timeout_ms: timeout.as_millis() as u64,
        })?,
      None => self.run().await,
    }
  }
}

fn single_input(
  step_id: &str,
  inputs: &[Input],
) -> Result<Arc<dyn Computable<Value>>, PipelineError> {
  match inputs {
    [input] => Ok(Arc::clone(&input.source)),
    _ => Err(PipelineError::InputCount {
      step_id: step_id.to_string(),
      expected: 1,
      actual: inputs.len(),
    }),
  }
}
