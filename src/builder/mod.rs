//! Plan construction.
//!
//! This module validates requests and translates them into per-tool plans.

pub mod backend;
pub mod plan;
pub mod planner;
pub mod script;
pub mod validation;

pub use backend::{Backend, BackendAdapter};
pub use plan::{CommandSpec, Plan, Step, StepKind};
pub use planner::{CommandPlanner, PlanError};
pub use validation::{validate, Rule, Validated, ValidationError};
