//! Control script rendering.
//!
//! Riviera-PRO runs do-files and Vivado runs Tcl scripts. Both are rendered
//! here as plain text from an already validated request: no escaping, no
//! global state, no file I/O. The same request always renders to the same
//! bytes. Writing the text to disk is the execution layer's job.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::request::Generic;

pub mod riviera;
pub mod vivado;

static CREATE_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^create_clock\s+-period\s+(\S+)\s+-name\s+(\S+)\s").unwrap()
});

/// First line of every generated script.
pub const HEADER: &str = "# Generated by hdlflow. Changes are overwritten on the next run.";

/// Line-oriented text builder for scripts.
#[derive(Debug, Default)]
pub struct ScriptText {
    text: String,
}

impl ScriptText {
    /// Start a script with the standard header comment.
    pub fn new() -> Self {
        let mut script = ScriptText::default();
        script.line(HEADER);
        script
    }

    /// Append one line.
    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        // Writing to a String cannot fail
        let _ = writeln!(self.text, "{}", line.as_ref());
        self
    }

    /// Append a line only when `cond` holds.
    pub fn line_if(&mut self, cond: bool, line: impl AsRef<str>) -> &mut Self {
        if cond {
            self.line(line);
        }
        self
    }

    pub fn finish(self) -> String {
        self.text
    }
}

/// Render generics as `<prefix>NAME=VALUE` words, in order.
pub fn generic_words<'a>(prefix: &'a str, generics: &'a [Generic]) -> impl Iterator<Item = String> + 'a {
    generics.iter().map(move |g| format!("{}{}={}", prefix, g.name, g.value))
}

/// Render a clock period exactly: `2.0`, `10.0`, `3.333`.
///
/// `{:?}` prints the shortest text that parses back to the same `f64`.
pub fn format_period(period_ns: f64) -> String {
    format!("{:?}", period_ns)
}

/// XDC clock constraints, one `create_clock` per port, ordered by port name.
pub fn render_clock_constraints(clocks: &BTreeMap<String, f64>) -> String {
    let mut xdc = ScriptText::new();
    for (port, period) in clocks {
        xdc.line(format!(
            "create_clock -period {} -name {} [get_ports {}]",
            format_period(*period),
            port,
            port
        ));
    }
    xdc.finish()
}

/// Read `create_clock` directives back into a port -> period map.
///
/// Lines that do not parse are skipped.
pub fn extract_clock_constraints(text: &str) -> BTreeMap<String, f64> {
    CREATE_CLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let period = caps[1].parse::<f64>().ok()?;
            Some((caps[2].to_string(), period))
        })
        .collect()
}

/// Surfer command file that groups every signal under `top` and saves the
/// resulting state for the next session.
pub fn render_surfer_commands(top: &str) -> String {
    let mut commands = String::new();
    let _ = writeln!(commands, "scope_add_as_group_recursive {}", top);
    let _ = writeln!(commands, "save_state_as {}.ron", top);
    commands
}
