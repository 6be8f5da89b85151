//! Template inputs of a step.
//!
//! Values are minijinja templates rendered against the step's upstream data,
//! keyed by slot name. The rendered string is then parsed according to the
//! step's schema:
//!
//! ```json
//! {
//!   "key": "{{ issue.key }}",
//!   "count": "{{ results.tests | length }}",
//!   "summary": "Run of {{ results.tests | length }} tests"
//! }
//! ```
//!
//! With `count` declared as an integer it becomes `2`, not `"2"`.

/// A template string resolved when the step runs.
pub type InputValue = String;
