//! Building a command graph from a pipeline definition.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};
use xrayflow_command::{Command, Computable};
use xrayflow_config::PipelineDef;
use xrayflow_executor::{EdgeOptions, ExecutableGraph, ExecutionResult};
use xrayflow_graph::{DirectedGraph, GraphError};

use crate::error::PipelineError;
use crate::step::{Input, PipelineStep, StepBody};

/// Read and parse a pipeline definition from a JSON file.
pub fn load_definition(path: impl AsRef<Path>) -> Result<PipelineDef, PipelineError> {
  let path = path.as_ref();
  let content = std::fs::read_to_string(path).map_err(|source| PipelineError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&content).map_err(|source| PipelineError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

/// A pipeline wired into an [`ExecutableGraph`], ready to run.
pub struct Pipeline {
  name: String,
  graph: ExecutableGraph<PipelineStep>,
  steps: HashMap<String, Arc<PipelineStep>>,
  layout: DirectedGraph<String, EdgeOptions>,
}

impl Pipeline {
  /// Validate `def` and build one command per step.
  ///
  /// Every step reads its inputs from the commands of its upstream steps, so
  /// steps are constructed in dependency order; they are placed in the graph
  /// in definition order.
  #[instrument(name = "pipeline_build", skip(def), fields(pipeline = %def.name))]
  pub fn build(def: &PipelineDef) -> Result<Self, PipelineError> {
    let layout = layout(def)?;

    let mut steps: HashMap<String, Arc<PipelineStep>> = HashMap::with_capacity(def.steps.len());
    for step_id in layout.topological_sort()? {
      let Some(step) = def.step(step_id) else {
        continue;
      };
      let inputs = layout
        .incoming(step_id)
        .into_iter()
        .map(|(from, options)| {
          let source: Arc<dyn Computable<Value>> = lookup(&steps, from)?;
          Ok(Input {
            slot: options.slot.clone().unwrap_or_else(|| from.clone()),
            optional: options.optional,
            source,
          })
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;
      let body = StepBody::new(step, inputs)?;
      steps.insert(step_id.clone(), Arc::new(Command::new(step_id.clone(), body)));
    }

    let graph = ExecutableGraph::default();
    for step in &def.steps {
      graph.place(lookup(&steps, &step.step_id)?)?;
    }
    for (from, to, options) in layout.edges() {
      graph.connect(lookup(&steps, from)?, lookup(&steps, to)?, options.clone())?;
    }

    info!(steps = def.steps.len(), edges = def.edges.len(), "pipeline_built");
    Ok(Self {
      name: def.name.clone(),
      graph,
      steps,
      layout,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn graph(&self) -> &ExecutableGraph<PipelineStep> {
    &self.graph
  }

  pub fn step(&self, step_id: &str) -> Option<&Arc<PipelineStep>> {
    self.steps.get(step_id)
  }

  /// Step ids in an order that respects every dependency.
  pub fn execution_order(&self) -> Result<Vec<String>, PipelineError> {
    Ok(
      self
        .graph
        .execution_order()?
        .iter()
        .map(|step| step.body().step_id().to_string())
        .collect(),
    )
  }

  /// Steps without inputs, in definition order.
  pub fn entry_steps(&self) -> Vec<&str> {
    self.layout.roots().into_iter().map(String::as_str).collect()
  }

  /// Steps nothing else reads from, in definition order.
  pub fn final_steps(&self) -> Vec<&str> {
    self.layout.leaves().into_iter().map(String::as_str).collect()
  }

  /// Every step that reads `step_id`'s output, directly or through other
  /// steps. These are the steps a failure of `step_id` can reach.
  pub fn downstream(&self, step_id: &str) -> Result<Vec<&str>, PipelineError> {
    let start = step_id.to_string();
    if !self.layout.contains(&start) {
      return Err(GraphError::vertex_not_found(step_id).into());
    }
    Ok(
      self
        .layout
        .depth_first(&start)
        .into_iter()
        .skip(1)
        .map(String::as_str)
        .collect(),
    )
  }

  /// Run every step once.
  pub async fn run(&self) -> ExecutionResult {
    self.graph.execute().await
  }

  /// Output of `step_id` in `result`, if it succeeded.
  pub fn output<'a>(&self, result: &'a ExecutionResult, step_id: &str) -> Option<&'a Value> {
    result.value::<Value>(self.steps.get(step_id)?)
  }
}

/// Step ids and their edges, validated.
fn layout(def: &PipelineDef) -> Result<DirectedGraph<String, EdgeOptions>, PipelineError> {
  let mut layout = DirectedGraph::new();
  for step in &def.steps {
    if !layout.add_vertex(step.step_id.clone()) {
      return Err(PipelineError::DuplicateStep {
        step_id: step.step_id.clone(),
      });
    }
  }

  let mut slots = HashSet::new();
  for edge in &def.edges {
    for step_id in [&edge.from, &edge.to] {
      if !layout.contains(step_id) {
        return Err(PipelineError::UnknownStep {
          from: edge.from.clone(),
          to: edge.to.clone(),
          step_id: step_id.clone(),
        });
      }
    }

    let slot = edge.slot.clone().unwrap_or_else(|| edge.from.clone());
    // Declaring the same edge twice is fine; two edges into one slot are not.
    if !slots.insert((edge.to.clone(), slot.clone())) && layout.edge(&edge.from, &edge.to).is_none()
    {
      return Err(PipelineError::DuplicateSlot {
        step_id: edge.to.clone(),
        slot,
      });
    }

    let options = EdgeOptions {
      optional: edge.optional,
      slot: edge.slot.clone(),
    };
    layout.connect(edge.from.clone(), edge.to.clone(), options)?;
  }
  Ok(layout)
}

fn lookup(
  steps: &HashMap<String, Arc<PipelineStep>>,
  step_id: &str,
) -> Result<Arc<PipelineStep>, PipelineError> {
  steps
    .get(step_id)
    .cloned()
    .ok_or_else(|| GraphError::vertex_not_found(step_id).into())
}
