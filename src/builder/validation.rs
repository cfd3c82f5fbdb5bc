//! Request validation.
//!
//! Every request passes through [`validate`] before a plan is built. The
//! checks run in rule order and stop at the first violation:
//!
//! 1. a cocotb module needs a simulator that can host it (not Vivado)
//! 2. synthesis, implementation and bitstreams need Vivado
//! 3. out-of-context mode and clock constraints need a synthesis level
//! 4. part and board need Vivado
//! 5. an external waveform viewer needs nvc or Riviera-PRO
//! 6. the request is well formed (sources, top, unique generics, clean strings)
//! 7. a stop time is strictly positive
//!
//! Rules 1, 2, 4 and 5 are tool compatibility rules and live in the
//! [`COMPATIBILITY_RULES`] table.
//!
//! Generated scripts are plain text templates without quoting, so rule 6 also
//! rejects any user string that Tcl would interpret.

use std::collections::HashSet;
use std::ops::Deref;
use std::path::Path;
use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

use crate::core::language::top_language;
use crate::core::request::{RequestSpec, Tool};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

static PYTHON_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap()
});

static SCRIPT_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\s\p{Cc}{}\[\]$;"\\`]"#).unwrap());

/// Validation rules, numbered in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    CocotbBackend = 1,
    SynthesisBackend = 2,
    SynthesisRequired = 3,
    PartBoardBackend = 4,
    WaveViewerBackend = 5,
    WellFormed = 6,
    StopTime = 7,
}

impl Rule {
    /// All rules in check order.
    pub const ALL: [Rule; 7] = [
        Rule::CocotbBackend,
        Rule::SynthesisBackend,
        Rule::SynthesisRequired,
        Rule::PartBoardBackend,
        Rule::WaveViewerBackend,
        Rule::WellFormed,
        Rule::StopTime,
    ];

    /// Rule number (1-7).
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Whether the rule is about a feature the selected tool cannot provide.
    pub fn is_compatibility_rule(&self) -> bool {
        matches!(
            self,
            Rule::CocotbBackend
                | Rule::SynthesisBackend
                | Rule::PartBoardBackend
                | Rule::WaveViewerBackend
        )
    }
}

/// A request that breaks one of the validation rules.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ValidationError {
    #[error("{field} `{value}` is not supported by {tool} (supported: {supported})")]
    #[diagnostic(
        code(hdlflow::validate::unsupported_combination),
        help("drop the option or pick a tool that supports it")
    )]
    UnsupportedCombination {
        rule: Rule,
        tool: Tool,
        field: &'static str,
        value: String,
        supported: String,
    },

    #[error("{field} `{value}` requires --synth, --impl or --bitstream")]
    #[diagnostic(code(hdlflow::validate::synthesis_required))]
    SynthesisRequired { field: &'static str, value: String },

    #[error("invalid {field} `{value}`: {reason}")]
    #[diagnostic(code(hdlflow::validate::invalid_field))]
    InvalidField {
        rule: Rule,
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ValidationError {
    /// Create an invalid-field error.
    pub fn invalid(
        rule: Rule,
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidField {
            rule,
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// The rule that failed.
    pub fn rule(&self) -> Rule {
        match self {
            ValidationError::UnsupportedCombination { rule, .. } => *rule,
            ValidationError::SynthesisRequired { .. } => Rule::SynthesisRequired,
            ValidationError::InvalidField { rule, .. } => *rule,
        }
    }

    /// The offending field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::UnsupportedCombination { field, .. }
            | ValidationError::SynthesisRequired { field, .. }
            | ValidationError::InvalidField { field, .. } => field,
        }
    }

    /// The offending value, as given.
    pub fn value(&self) -> &str {
        match self {
            ValidationError::UnsupportedCombination { value, .. }
            | ValidationError::SynthesisRequired { value, .. }
            | ValidationError::InvalidField { value, .. } => value,
        }
    }

    /// Whether this is a tool/feature mismatch (rules 1, 2, 4 and 5).
    pub fn is_unsupported_combination(&self) -> bool {
        matches!(self, ValidationError::UnsupportedCombination { .. })
    }
}

/// A feature that only some tools provide.
pub struct CompatibilityRule {
    pub rule: Rule,
    pub field: &'static str,
    /// The requested value, if the request uses the feature
    pub requested: fn(&RequestSpec) -> Option<String>,
    /// Tools that provide the feature
    pub supported: &'static [Tool],
}

impl CompatibilityRule {
    fn check(&self, spec: &RequestSpec) -> Result<(), ValidationError> {
        match (self.requested)(spec) {
            Some(value) if !self.supported.contains(&spec.tool) => {
                Err(ValidationError::UnsupportedCombination {
                    rule: self.rule,
                    tool: spec.tool,
                    field: self.field,
                    value,
                    supported: self
                        .supported
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
            _ => Ok(()),
        }
    }
}

fn cocotb_requested(spec: &RequestSpec) -> Option<String> {
    spec.cocotb_module.clone()
}

fn synthesis_requested(spec: &RequestSpec) -> Option<String> {
    (!spec.synth_mode.is_none()).then(|| spec.synth_mode.as_str().to_string())
}

fn part_requested(spec: &RequestSpec) -> Option<String> {
    spec.part.clone()
}

fn board_requested(spec: &RequestSpec) -> Option<String> {
    spec.board.clone()
}

fn wave_viewer_requested(spec: &RequestSpec) -> Option<String> {
    spec.wave_viewer.map(|viewer| viewer.to_string())
}

/// Tool compatibility matrix.
pub const COMPATIBILITY_RULES: &[CompatibilityRule] = &[
    CompatibilityRule {
        rule: Rule::CocotbBackend,
        field: "cocotb module",
        requested: cocotb_requested,
        supported: &[Tool::Nvc, Tool::Riviera],
    },
    CompatibilityRule {
        rule: Rule::SynthesisBackend,
        field: "synthesis mode",
        requested: synthesis_requested,
        supported: &[Tool::Vivado],
    },
    CompatibilityRule {
        rule: Rule::PartBoardBackend,
        field: "part",
        requested: part_requested,
        supported: &[Tool::Vivado],
    },
    CompatibilityRule {
        rule: Rule::PartBoardBackend,
        field: "board",
        requested: board_requested,
        supported: &[Tool::Vivado],
    },
    CompatibilityRule {
        rule: Rule::WaveViewerBackend,
        field: "waveform viewer",
        requested: wave_viewer_requested,
        supported: &[Tool::Nvc, Tool::Riviera],
    },
];

/// A request that passed [`validate`].
///
/// Backends only accept this type, so an unvalidated request can never reach
/// plan construction.
#[derive(Debug, Clone, Copy)]
pub struct Validated<'a> {
    spec: &'a RequestSpec,
}

impl<'a> Validated<'a> {
    pub fn spec(&self) -> &'a RequestSpec {
        self.spec
    }
}

impl Deref for Validated<'_> {
    type Target = RequestSpec;

    fn deref(&self) -> &RequestSpec {
        self.spec
    }
}

/// Check a request against every rule, in order.
///
/// Pure: the same request always gives the same answer, and a validated
/// request validates again.
pub fn validate(spec: &RequestSpec) -> Result<Validated<'_>, ValidationError> {
    for rule in Rule::ALL {
        check_rule(rule, spec)?;
    }
    Ok(Validated { spec })
}

fn check_rule(rule: Rule, spec: &RequestSpec) -> Result<(), ValidationError> {
    match rule {
        Rule::SynthesisRequired => check_synthesis_required(spec),
        Rule::WellFormed => check_well_formed(spec),
        Rule::StopTime => check_stop_time(spec),
        compat => COMPATIBILITY_RULES
            .iter()
            .filter(|entry| entry.rule == compat)
            .try_for_each(|entry| entry.check(spec)),
    }
}

fn check_synthesis_required(spec: &RequestSpec) -> Result<(), ValidationError> {
    if !spec.synth_mode.is_none() {
        return Ok(());
    }

    if spec.ooc {
        return Err(ValidationError::SynthesisRequired {
            field: "out-of-context mode",
            value: "--ooc".to_string(),
        });
    }

    if let Some((port, period)) = spec.clk_constraints.iter().next() {
        return Err(ValidationError::SynthesisRequired {
            field: "clock period constraint",
            value: format!("{}={:?}", port, period),
        });
    }

    Ok(())
}

fn check_well_formed(spec: &RequestSpec) -> Result<(), ValidationError> {
    if spec.sources.is_empty() {
        return Err(ValidationError::invalid(
            Rule::WellFormed,
            "compile order",
            "",
            "no source files listed",
        ));
    }

    check_identifier("top", &spec.top)?;

    // VHDL identifiers are case-insensitive, Verilog parameters are not
    let case_sensitive = top_language(&spec.top, &spec.sources)
        .is_some_and(|lang| lang.is_verilog_family());
    let mut seen = HashSet::new();
    for generic in &spec.generics {
        check_identifier("generic name", &generic.name)?;
        let key = if case_sensitive {
            generic.name.clone()
        } else {
            generic.name.to_ascii_lowercase()
        };
        if !seen.insert(key) {
            return Err(ValidationError::invalid(
                Rule::WellFormed,
                "generic",
                generic.to_string(),
                format!("`{}` is bound more than once", generic.name),
            ));
        }
        check_clean("generic value", &generic.value)?;
    }

    for plusarg in &spec.plusargs {
        let name = plusarg.split_once('=').map_or(plusarg.as_str(), |(name, _)| name);
        check_identifier("plusarg name", name)?;
        check_clean("plusarg", plusarg)?;
    }

    for source in &spec.sources {
        check_clean_path("source file", source)?;
    }

    if let Some(library) = &spec.default_library {
        check_identifier("work library", library)?;
    }

    if let Some(module) = &spec.cocotb_module {
        if !PYTHON_MODULE.is_match(module) {
            return Err(ValidationError::invalid(
                Rule::WellFormed,
                "cocotb module",
                module.as_str(),
                "expected a Python module name",
            ));
        }
    }

    for path in &spec.pythonpath_entries {
        check_clean_path("pythonpath entry", path)?;
    }

    let optional_paths = [
        ("waveform view file", &spec.waveform_view_file),
        ("libstdc++ path", &spec.libstdcpp_path),
        ("glbl path", &spec.glbl_path),
    ];
    for (field, path) in optional_paths {
        if let Some(path) = path {
            check_clean_path(field, path)?;
        }
    }

    if let Some(part) = &spec.part {
        check_clean("part", part)?;
    }
    if let Some(board) = &spec.board {
        check_clean("board", board)?;
    }

    for (port, period) in &spec.clk_constraints {
        check_identifier("clock port", port)?;
        if !period.is_finite() || *period <= 0.0 {
            return Err(ValidationError::invalid(
                Rule::WellFormed,
                "clock period constraint",
                format!("{}={}", port, period),
                "period must be a positive number of nanoseconds",
            ));
        }
    }

    if spec.jobs == Some(0) {
        return Err(ValidationError::invalid(
            Rule::WellFormed,
            "jobs",
            "0",
            "at least one job is required",
        ));
    }

    Ok(())
}

fn check_stop_time(spec: &RequestSpec) -> Result<(), ValidationError> {
    match spec.stop_time {
        Some(stop) if stop.value == 0 => Err(ValidationError::invalid(
            Rule::StopTime,
            "stop time",
            stop.to_string(),
            "must be greater than zero",
        )),
        _ => Ok(()),
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            Rule::WellFormed,
            field,
            value,
            "expected a letter followed by letters, digits or underscores",
        ))
    }
}

fn check_clean(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::invalid(
            Rule::WellFormed,
            field,
            value,
            "must not be empty",
        ));
    }
    if let Some(found) = SCRIPT_UNSAFE.find(value) {
        return Err(ValidationError::invalid(
            Rule::WellFormed,
            field,
            value,
            format!("character {:?} is not allowed", found.as_str()),
        ));
    }
    Ok(())
}

fn check_clean_path(field: &'static str, path: &Path) -> Result<(), ValidationError> {
    match path.to_str() {
        Some(text) => check_clean(field, text),
        None => Err(ValidationError::invalid(
            Rule::WellFormed,
            field,
            path.to_string_lossy(),
            "path is not valid UTF-8",
        )),
    }
}
