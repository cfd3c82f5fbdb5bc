//! Core data structures for hdlflow.
//!
//! - The normalized request (`RequestSpec`) and its value types
//! - Source language detection
//! - Compile-order files

pub mod compile_order;
pub mod language;
pub mod request;

pub use compile_order::{read_compile_order, CompileOrderError};
pub use language::HdlLanguage;
pub use request::{
    ClockConstraint, Generic, RequestSpec, StopTime, SynthMode, TimeUnit, Tool, WaveViewer,
};
