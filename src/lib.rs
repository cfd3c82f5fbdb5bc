//! hdlflow - One command line for HDL simulation and FPGA flows
//!
//! This crate turns a single normalized request into an ordered plan of tool
//! invocations for nvc, Riviera-PRO or Vivado, and runs that plan.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

pub use builder::{plan::Plan, planner::plan, PlanError, ValidationError};
pub use core::request::{RequestSpec, Tool};
