//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod process;
pub mod shell;

pub use config::Config;
pub use diagnostic::Diagnostic;
pub use process::ProcessBuilder;
pub use shell::{ColorChoice, Shell, Status};
