//! Integration tests for building and running pipelines.

use std::io::Write;

use serde_json::{Value, json};
use xrayflow_command::{CommandError, ComputableState};
use xrayflow_config::PipelineDef;
use xrayflow_executor::{GraphError, report};
use xrayflow_pipeline::{Pipeline, PipelineError, load_definition};

fn definition(value: Value) -> PipelineDef {
  serde_json::from_value(value).unwrap()
}

/// Fetch an issue, attach optional screenshots, then build an import request.
fn upload_pipeline() -> PipelineDef {
  definition(json!({
    "name": "upload",
    "steps": [
      { "step_id": "issue", "type": "constant", "value": { "key": "CYP-42", "summary": "login" } },
      { "step_id": "screenshots", "type": "fail", "message": "no screenshots found" },
      { "step_id": "results", "type": "constant", "value": { "tests": [ { "ok": true }, { "ok": false } ] } },
      {
        "step_id": "import",
        "type": "template",
        "inputs": {
          "key": "{{ issue.key }}",
          "count": "{{ results.tests | length }}",
          "attached": "{{ shots is defined }}"
        },
        "schema": {
          "properties": {
            "count": { "type": "integer" },
            "attached": { "type": "boolean" }
          }
        }
      },
      { "step_id": "key", "type": "pick", "field": "key" },
      { "step_id": "evidence", "type": "fallback", "value": [] },
      { "step_id": "collected", "type": "merge" }
    ],
    "edges": [
      { "from": "issue", "to": "import" },
      { "from": "results", "to": "import" },
      { "from": "screenshots", "to": "import", "optional": true, "slot": "shots" },
      { "from": "import", "to": "key" },
      { "from": "screenshots", "to": "evidence", "optional": true },
      { "from": "issue", "to": "collected", "optional": true },
      { "from": "screenshots", "to": "collected", "optional": true },
      { "from": "key", "to": "collected", "optional": true }
    ]
  }))
}

#[tokio::test]
async fn test_upload_pipeline() {
  let pipeline = Pipeline::build(&upload_pipeline()).unwrap();
  assert_eq!(pipeline.name(), "upload");

  let result = pipeline.run().await;

  assert_eq!(result.len(), 7);
  assert_eq!(result.failed().count(), 1);
  assert_eq!(result.skipped().count(), 0);
  assert!(!result.is_success());

  assert_eq!(
    pipeline.output(&result, "import"),
    Some(&json!({ "key": "CYP-42", "count": 2, "attached": false }))
  );
  assert_eq!(pipeline.output(&result, "key"), Some(&json!("CYP-42")));
  assert_eq!(pipeline.output(&result, "evidence"), Some(&json!([])));
  assert_eq!(
    pipeline.output(&result, "collected"),
    Some(&json!([{ "key": "CYP-42", "summary": "login" }, "CYP-42"]))
  );
  assert_eq!(pipeline.output(&result, "screenshots"), None);
}

#[tokio::test]
async fn test_failed_step_skips_required_dependents() {
  let def = definition(json!({
    "name": "broken",
    "steps": [
      { "step_id": "issue", "type": "fail", "message": "503 from jira" },
      { "step_id": "convert", "type": "template", "inputs": { "key": "{{ key }}" } },
      { "step_id": "import", "type": "pick", "field": "key" },
      { "step_id": "unrelated", "type": "constant", "value": 1 }
    ],
    "edges": [
      { "from": "issue", "to": "convert" },
      { "from": "convert", "to": "import" }
    ]
  }));
  let pipeline = Pipeline::build(&def).unwrap();

  let result = pipeline.run().await;

  let step = |id: &str| pipeline.step(id).unwrap();
  assert_eq!(result.status(step("issue")), Some(ComputableState::Failed));
  assert_eq!(result.status(step("convert")), Some(ComputableState::Skipped));
  assert_eq!(result.status(step("import")), Some(ComputableState::Skipped));
  assert_eq!(result.status(step("unrelated")), Some(ComputableState::Succeeded));

  let error = result.error(step("import")).unwrap();
  assert!(matches!(**error, CommandError::Skipped { .. }));
  assert_eq!(
    report::describe(error),
    "skipping import. Caused by: skipping convert. Caused by: 503 from jira"
  );

  let err = report::require_any_succeeded(&result, [step("import")], "import").unwrap_err();
  assert_eq!(err.to_string(), "nothing to import");
}

#[tokio::test]
async fn test_timed_out_step_fails() {
  let def = definition(json!({
    "name": "slow",
    "steps": [
      { "step_id": "slow", "type": "constant", "value": 1, "delay_ms": 500, "timeout_ms": 10 },
      { "step_id": "after", "type": "merge" }
    ],
    "edges": [ { "from": "slow", "to": "after" } ]
  }));
  let pipeline = Pipeline::build(&def).unwrap();

  let result = pipeline.run().await;

  let slow = pipeline.step("slow").unwrap();
  assert_eq!(result.status(slow), Some(ComputableState::Failed));
  assert_eq!(result.error(slow).unwrap().to_string(), "timed out after 10ms");
  assert_eq!(
    result.status(pipeline.step("after").unwrap()),
    Some(ComputableState::Skipped)
  );
}

#[test]
fn test_execution_order() {
  let pipeline = Pipeline::build(&upload_pipeline()).unwrap();
  let order = pipeline.execution_order().unwrap();
  let position = |id: &str| order.iter().position(|step| step == id).unwrap();

  assert_eq!(order.len(), 7);
  assert!(position("issue") < position("import"));
  assert!(position("results") < position("import"));
  assert!(position("screenshots") < position("import"));
  assert!(position("import") < position("key"));
  assert!(position("key") < position("collected"));
  assert!(position("screenshots") < position("evidence"));
}

#[test]
fn test_entry_and_final_steps() {
  let pipeline = Pipeline::build(&upload_pipeline()).unwrap();

  assert_eq!(pipeline.entry_steps(), vec!["issue", "screenshots", "results"]);
  assert_eq!(pipeline.final_steps(), vec!["evidence", "collected"]);
}

#[test]
fn test_downstream_steps() {
  let pipeline = Pipeline::build(&upload_pipeline()).unwrap();

  assert_eq!(
    pipeline.downstream("screenshots").unwrap(),
    vec!["import", "key", "collected", "evidence"]
  );
  assert_eq!(pipeline.downstream("key").unwrap(), vec!["collected"]);
  assert!(pipeline.downstream("collected").unwrap().is_empty());
  assert!(matches!(
    pipeline.downstream("ghost"),
    Err(PipelineError::Graph(GraphError::VertexNotFound(_)))
  ));
}

#[test]
fn test_build_rejects_duplicate_step() {
  let def = definition(json!({
    "name": "dup",
    "steps": [
      { "step_id": "a", "type": "constant", "value": 1 },
      { "step_id": "a", "type": "constant", "value": 2 }
    ]
  }));
  assert!(matches!(
    Pipeline::build(&def),
    Err(PipelineError::DuplicateStep { step_id }) if step_id == "a"
  ));
}

#[test]
fn test_build_rejects_unknown_step() {
  let def = definition(json!({
    "name": "unknown",
    "steps": [ { "step_id": "a", "type": "constant", "value": 1 } ],
    "edges": [ { "from": "a", "to": "ghost" } ]
  }));
  let err = Pipeline::build(&def).err().unwrap();
  assert_eq!(err.to_string(), "edge a -> ghost references unknown step 'ghost'");
}

#[test]
fn test_build_rejects_duplicate_slot() {
  let def = definition(json!({
    "name": "slots",
    "steps": [
      { "step_id": "a", "type": "constant", "value": 1 },
      { "step_id": "b", "type": "constant", "value": 2 },
      { "step_id": "c", "type": "template", "inputs": {} }
    ],
    "edges": [
      { "from": "a", "to": "c", "slot": "data" },
      { "from": "b", "to": "c", "slot": "data" }
    ]
  }));
  assert!(matches!(
    Pipeline::build(&def),
    Err(PipelineError::DuplicateSlot { step_id, slot }) if step_id == "c" && slot == "data"
  ));
}

#[test]
fn test_build_accepts_repeated_edge() {
  let def = definition(json!({
    "name": "repeat",
    "steps": [
      { "step_id": "a", "type": "constant", "value": 1 },
      { "step_id": "b", "type": "merge" }
    ],
    "edges": [
      { "from": "a", "to": "b" },
      { "from": "a", "to": "b" }
    ]
  }));
  let pipeline = Pipeline::build(&def).unwrap();
  assert_eq!(pipeline.graph().edges().len(), 1);
}

#[test]
fn test_build_rejects_cycle() {
  let def = definition(json!({
    "name": "cycle",
    "steps": [
      { "step_id": "a", "type": "merge" },
      { "step_id": "b", "type": "merge" }
    ],
    "edges": [
      { "from": "a", "to": "b" },
      { "from": "b", "to": "a" }
    ]
  }));
  assert!(matches!(
    Pipeline::build(&def),
    Err(PipelineError::Graph(GraphError::CycleDetected { .. }))
  ));
}

#[test]
fn test_build_rejects_pick_without_input() {
  let def = definition(json!({
    "name": "pick",
    "steps": [ { "step_id": "p", "type": "pick", "field": "key" } ]
  }));
  assert!(matches!(
    Pipeline::build(&def),
    Err(PipelineError::InputCount { actual: 0, .. })
  ));
}

#[tokio::test]
async fn test_load_definition_from_file() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  write!(
    file,
    "{}",
    json!({
      "name": "file",
      "steps": [ { "step_id": "a", "type": "constant", "value": "hello" } ]
    })
  )
  .unwrap();

  let def = load_definition(file.path()).unwrap();
  let pipeline = Pipeline::build(&def).unwrap();
  let result = pipeline.run().await;

  assert!(result.is_success());
  assert_eq!(pipeline.output(&result, "a"), Some(&json!("hello")));
}

#[test]
fn test_load_definition_errors() {
  let dir = tempfile::tempdir().unwrap();

  let missing = dir.path().join("missing.json");
  assert!(matches!(
    load_definition(&missing),
    Err(PipelineError::Read { .. })
  ));

  let invalid = dir.path().join("invalid.json");
  std::fs::write(&invalid, "{ not json").unwrap();
  let err = load_definition(&invalid).unwrap_err();
  assert!(matches!(err, PipelineError::Parse { .. }));
  assert!(err.to_string().starts_with("failed to parse pipeline"));
}
