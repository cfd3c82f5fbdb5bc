//! High-level operations.
//!
//! Everything here touches the outside world: tool lookup on PATH, the
//! output directory and the simulator processes themselves.

pub mod cocotb;
pub mod hdl_run;

pub use hdl_run::{check_dependencies, execute, ExecuteOptions};
