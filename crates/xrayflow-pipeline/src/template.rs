//! Template inputs of a step.
//!
//! Inputs are rendered with minijinja against the step's upstream data, then
//! coerced to typed JSON values according to the step's schema.
//!
//! # Context
//! Upstream values are keyed by slot (the edge's `slot`, or the upstream step
//! id):
//! ```json
//! { "key": "{{ issue.key }}", "count": "{{ results.tests | length }}" }
//! ```
//!
//! When a step has exactly one input and it is an object, its fields are also
//! available at the top level, so `{{ key }}` works as well as `{{ issue.key }}`.
//! Slot names win over fields of the same name.

use std::collections::HashMap;

use minijinja::Environment;
use serde_json::{Map, Value};

use crate::error::PipelineError;

/// JSON Schema property types used for coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
  String,
  Number,
  Integer,
  Boolean,
  Null,
  Array,
  Object,
}

impl SchemaType {
  fn parse(name: &str) -> Self {
    match name {
      "number" => Self::Number,
      "integer" => Self::Integer,
      "boolean" => Self::Boolean,
      "null" => Self::Null,
      "array" => Self::Array,
      "object" => Self::Object,
      _ => Self::String,
    }
  }
}

/// Property types declared by a simple object schema.
///
/// Composite schemas (`anyOf`, `oneOf`, ...) are not understood; their
/// properties fall back to strings.
pub fn extract_schema_types(schema: &Value) -> HashMap<String, SchemaType> {
  let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
    return HashMap::new();
  };
  properties
    .iter()
    .filter_map(|(name, property)| {
      let kind = property.get("type")?.as_str()?;
      Some((name.clone(), SchemaType::parse(kind)))
    })
    .collect()
}

/// Build the rendering context from `(slot, value)` pairs.
pub fn build_context(upstream: &[(String, Value)]) -> Value {
  let mut context = Map::new();
  if let [(_, Value::Object(fields))] = upstream {
    context.extend(fields.clone());
  }
  for (slot, value) in upstream {
    context.insert(slot.clone(), value.clone());
  }
  Value::Object(context)
}

/// Render every template against `context`.
pub fn render_inputs(
  step_id: &str,
  templates: &HashMap<String, String>,
  context: &Value,
) -> Result<HashMap<String, String>, PipelineError> {
  let env = Environment::new();
  let context = minijinja::Value::from_serialize(context);

  templates
    .iter()
    .map(|(key, template)| {
      env
        .render_str(template, context.clone())
        .map(|rendered| (key.clone(), rendered))
        .map_err(|e| {
          PipelineError::input_resolution(step_id, format!("failed to render '{key}': {e}"))
        })
    })
    .collect()
}

/// Turn rendered strings into a JSON object, typed per `schema`.
///
/// Keys missing from the schema stay strings.
pub fn coerce_inputs(
  step_id: &str,
  rendered: &HashMap<String, String>,
  schema: &HashMap<String, SchemaType>,
) -> Result<Value, PipelineError> {
  let mut object = Map::new();
  for (key, raw) in rendered {
    let kind = schema.get(key).copied().unwrap_or(SchemaType::String);
    let value = coerce_value(raw, kind).map_err(|expected| {
      PipelineError::input_resolution(step_id, format!("'{key}' expected {expected}, got '{raw}'"))
    })?;
    object.insert(key.clone(), value);
  }
  Ok(Value::Object(object))
}

/// Parse one rendered string. On failure, returns what was expected.
fn coerce_value(raw: &str, kind: SchemaType) -> Result<Value, &'static str> {
  match kind {
    SchemaType::String => Ok(Value::String(raw.to_string())),
    SchemaType::Number => raw
      .trim()
      .parse::<f64>()
      .ok()
      .and_then(serde_json::Number::from_f64)
      .map(Value::Number)
      .ok_or("number"),
    SchemaType::Integer => raw
      .trim()
      .parse::<i64>()
      .map(Value::from)
      .map_err(|_| "integer"),
    SchemaType::Boolean => match raw.trim().to_lowercase().as_str() {
      "true" => Ok(Value::Bool(true)),
      "false" => Ok(Value::Bool(false)),
      _ => Err("boolean"),
    },
    SchemaType::Null => match raw.trim() {
      "" | "null" | "none" => Ok(Value::Null),
      _ => Err("null"),
    },
    SchemaType::Array => match serde_json::from_str::<Value>(raw) {
      Ok(value @ Value::Array(_)) => Ok(value),
      _ => Err("array"),
    },
    SchemaType::Object => match serde_json::from_str::<Value>(raw) {
      Ok(value @ Value::Object(_)) => Ok(value),
      _ => Err("object"),
    },
  }
}
