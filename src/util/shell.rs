//! Status output for the command line.
//!
//! Status lines go to stderr as `{status:>12} {message}` so stdout stays free
//! for machine-readable output such as `--plan`.

use std::fmt::Display;
use std::io::{self, IsTerminal};

use crate::builder::plan::StepKind;

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Never use ANSI colors.
    Never,
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Created,
    Finished,

    // In-progress statuses (cyan)
    Analyzing,
    Elaborating,
    Running,
    Synthesizing,
    Implementing,
    Writing,
    Viewing,

    // Error status (red)
    Error,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "Created",
            Status::Finished => "Finished",
            Status::Analyzing => "Analyzing",
            Status::Elaborating => "Elaborating",
            Status::Running => "Running",
            Status::Synthesizing => "Synthesizing",
            Status::Implementing => "Implementing",
            Status::Writing => "Writing",
            Status::Viewing => "Viewing",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Created | Status::Finished => "\x1b[1;32m",
            Status::Error => "\x1b[1;31m",
            _ => "\x1b[1;36m",
        }
    }

    /// Status shown while a step of this kind runs.
    pub fn for_step(kind: StepKind) -> Self {
        match kind {
            StepKind::Analyze => Status::Analyzing,
            StepKind::Elaborate => Status::Elaborating,
            StepKind::Run => Status::Running,
            StepKind::Synthesize => Status::Synthesizing,
            StepKind::Implement => Status::Implementing,
            StepKind::Bitstream => Status::Writing,
            StepKind::LaunchWaveform => Status::Viewing,
        }
    }
}

/// Central shell for CLI status output.
#[derive(Debug)]
pub struct Shell {
    use_color: bool,
}

impl Shell {
    pub fn new(color: ColorChoice) -> Self {
        let use_color = match color {
            ColorChoice::Auto => io::stderr().is_terminal(),
            ColorChoice::Never => false,
        };
        Shell { use_color }
    }

    /// Check if colors are enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    pub fn status(&self, status: Status, msg: impl Display) {
        eprintln!("{} {}", self.format_status(status), msg);
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!("{}{:>12}\x1b[0m", status.color_code(), status.as_str())
        } else {
            format!("{:>12}", status.as_str())
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ColorChoice::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status_alignment() {
        let shell = Shell::new(ColorChoice::Never);
        assert_eq!(shell.format_status(Status::Running), "     Running");
        assert_eq!(shell.format_status(Status::Synthesizing), "Synthesizing");
    }

    #[test]
    fn test_format_status_color() {
        let shell = Shell { use_color: true };
        assert!(shell.use_color());
        assert_eq!(
            shell.format_status(Status::Finished),
            "\x1b[1;32m    Finished\x1b[0m"
        );
    }

    #[test]
    fn test_status_for_step() {
        assert_eq!(Status::for_step(StepKind::Analyze), Status::Analyzing);
        assert_eq!(Status::for_step(StepKind::Bitstream), Status::Writing);
        assert_eq!(Status::for_step(StepKind::LaunchWaveform), Status::Viewing);
    }
}
