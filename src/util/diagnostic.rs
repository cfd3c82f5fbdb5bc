//! User-facing error reports.
//!
//! Every report names what went wrong and, where one exists, the change that
//! makes the command work.

use std::fmt;

use crate::builder::validation::{Rule, ValidationError};

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a cocotb run is requested from Vivado.
    pub const COCOTB_TOOLS: &str = "run cocotb tests with nvc or riviera";

    /// Suggestion for FPGA flow options on a simulator.
    pub const SYNTHESIS_TOOLS: &str = "use `hdlflow vivado ...` for synthesis, implementation and bitstreams";

    /// Suggestion for OOC or clock constraints without a synthesis mode.
    pub const ADD_SYNTH_FLAG: &str = "add --synth, --impl or --bitstream";

    /// Suggestion for an external viewer on Vivado.
    pub const VIVADO_VIEWER: &str =
        "Vivado shows waveforms itself: use --gui and --waveform-view-file instead of --wave";

    /// Suggestion for malformed generics.
    pub const GENERIC_FORMAT: &str = "generics are given as -g NAME=VALUE, once per name";

    /// Suggestion for bad stop times.
    pub const STOP_TIME_FORMAT: &str = "pass a positive integer and a unit, e.g. --stop-time 10 us";

    /// Suggestion when a tool is missing from PATH.
    pub const MISSING_TOOL: &str = "install the tool or add its bin directory to PATH";

    /// Suggestion when a cocotb run leaves no results behind.
    pub const COCOTB_NO_RESULTS: &str =
        "check that the cocotb module can be imported and defines at least one test";

    /// Suggestion when a step fails.
    pub const STEP_FAILED: &str = "rerun with -v 2 for the full command lines";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Report for a rejected request.
    pub fn from_validation(err: &ValidationError) -> Self {
        let diag = Diagnostic::error(err.to_string())
            .with_context(format!("rule {} of request validation", err.rule().number()));

        let suggestion = match (err.rule(), err.field()) {
            (Rule::CocotbBackend, _) => Some(suggestions::COCOTB_TOOLS),
            (Rule::SynthesisBackend, _) | (Rule::PartBoardBackend, _) => {
                Some(suggestions::SYNTHESIS_TOOLS)
            }
            (Rule::SynthesisRequired, _) => Some(suggestions::ADD_SYNTH_FLAG),
            (Rule::WaveViewerBackend, _) => Some(suggestions::VIVADO_VIEWER),
            (Rule::WellFormed, "generic") | (Rule::WellFormed, "generic name") => {
                Some(suggestions::GENERIC_FORMAT)
            }
            (Rule::StopTime, _) => Some(suggestions::STOP_TIME_FORMAT),
            _ => None,
        };

        match suggestion {
            Some(s) => diag.with_suggestion(s),
            None => diag,
        }
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };
        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        let help_prefix = if color {
            "\x1b[1;32mhelp\x1b[0m"
        } else {
            "help"
        };
        for suggestion in &self.suggestions {
            output.push_str(&format!("{}: {}\n", help_prefix, suggestion));
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::validation::validate;
    use crate::core::request::{RequestSpec, Tool};
    use std::path::PathBuf;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("`vsimsa` not found on PATH")
            .with_context("needed by the analyze step")
            .with_suggestion(suggestions::MISSING_TOOL);

        let output = diag.format(false);
        assert!(output.starts_with("error: `vsimsa` not found on PATH\n"));
        assert!(output.contains("  = needed by the analyze step"));
        assert!(output.contains("help: install the tool"));
    }

    #[test]
    fn test_validation_report() {
        let spec = RequestSpec::new(Tool::Vivado, "top", vec![PathBuf::from("/top.vhd")])
            .with_cocotb("test_top");
        let err = validate(&spec).unwrap_err();

        let output = Diagnostic::from_validation(&err).format(false);
        assert!(output.contains("cocotb module `test_top` is not supported by vivado"));
        assert!(output.contains("rule 1"));
        assert!(output.contains(suggestions::COCOTB_TOOLS));
    }

    #[test]
    fn test_warning_color() {
        let output = Diagnostic::warning("nvc has no GUI").format(true);
        assert!(output.starts_with("\x1b[1;33mwarning"));
    }
}
