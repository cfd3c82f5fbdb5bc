//! The normalized request.
//!
//! A `RequestSpec` holds every user-supplied option in one place, whatever the
//! backend. It is data only: compatibility rules live in
//! `builder::validation` and translation lives in `builder::backend`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::builder::validation::{Rule, ValidationError};

/// Library used when no `--work` is given.
pub const DEFAULT_LIBRARY: &str = "work";

/// Parallel jobs for Vivado runs when none are configured.
pub const DEFAULT_JOBS: u32 = 4;

/// Supported EDA tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// nvc, the open-source VHDL simulator
    Nvc,
    /// Aldec Riviera-PRO
    Riviera,
    /// AMD Vivado (xsim simulation and FPGA implementation)
    Vivado,
}

impl Tool {
    /// All tools, in CLI help order.
    pub const ALL: [Tool; 3] = [Tool::Nvc, Tool::Riviera, Tool::Vivado];

    /// Get the tool name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Nvc => "nvc",
            Tool::Riviera => "riviera",
            Tool::Vivado => "vivado",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tool {
    type Err = ToolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nvc" => Ok(Tool::Nvc),
            "riviera" => Ok(Tool::Riviera),
            "vivado" => Ok(Tool::Vivado),
            _ => Err(ToolParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown EDA tool.
#[derive(Debug, Clone)]
pub struct ToolParseError(pub String);

impl std::fmt::Display for ToolParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported EDA tool '{}', valid values: nvc, riviera, vivado",
            self.0
        )
    }
}

impl std::error::Error for ToolParseError {}

/// External waveform viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveViewer {
    Gtkwave,
    Surfer,
}

impl WaveViewer {
    /// Get the viewer name as a string. This is also its executable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaveViewer::Gtkwave => "gtkwave",
            WaveViewer::Surfer => "surfer",
        }
    }
}

impl std::fmt::Display for WaveViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WaveViewer {
    type Err = WaveViewerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gtkwave" => Ok(WaveViewer::Gtkwave),
            "surfer" => Ok(WaveViewer::Surfer),
            _ => Err(WaveViewerParseError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown waveform viewer.
#[derive(Debug, Clone)]
pub struct WaveViewerParseError(pub String);

impl std::fmt::Display for WaveViewerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported waveform viewer '{}', valid values: gtkwave, surfer",
            self.0
        )
    }
}

impl std::error::Error for WaveViewerParseError {}

/// Simulation time unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Fs,
    Ps,
    Ns,
    Us,
    Ms,
    Sec,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Fs => "fs",
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::Sec => "sec",
        }
    }

    /// Short suffix accepted by simulators that glue value and unit (`10ms`, `1s`).
    pub fn as_suffix(&self) -> &'static str {
        match self {
            TimeUnit::Sec => "s",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fs" => Ok(TimeUnit::Fs),
            "ps" => Ok(TimeUnit::Ps),
            "ns" => Ok(TimeUnit::Ns),
            "us" => Ok(TimeUnit::Us),
            "ms" => Ok(TimeUnit::Ms),
            "sec" => Ok(TimeUnit::Sec),
            _ => Err(ValidationError::invalid(
                Rule::StopTime,
                "stop time unit",
                s,
                "expected one of: fs, ps, ns, us, ms, sec",
            )),
        }
    }
}

/// Simulation stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub value: u64,
    pub unit: TimeUnit,
}

impl StopTime {
    pub fn new(value: u64, unit: TimeUnit) -> Self {
        StopTime { value, unit }
    }

    /// Parse the two words of `--stop-time VALUE UNIT`.
    pub fn parse(value: &str, unit: &str) -> Result<Self, ValidationError> {
        let parsed = value.trim().parse::<u64>().map_err(|_| {
            ValidationError::invalid(
                Rule::StopTime,
                "stop time",
                value,
                "expected a non-negative integer",
            )
        })?;
        Ok(StopTime::new(parsed, unit.trim().parse()?))
    }
}

impl std::fmt::Display for StopTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// How far the Vivado flow goes past elaboration.
///
/// The levels form a strict prefix order: implementing requires synthesis and
/// a bitstream requires implementation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SynthMode {
    /// Simulation only
    #[default]
    None,
    Synthesize,
    Implement,
    Bitstream,
}

impl SynthMode {
    /// Pick the deepest level requested by the `--synth`, `--impl` and
    /// `--bitstream` flags.
    pub fn from_flags(synth: bool, implement: bool, bitstream: bool) -> Self {
        if bitstream {
            SynthMode::Bitstream
        } else if implement {
            SynthMode::Implement
        } else if synth {
            SynthMode::Synthesize
        } else {
            SynthMode::None
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SynthMode::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SynthMode::None => "none",
            SynthMode::Synthesize => "synthesize",
            SynthMode::Implement => "implement",
            SynthMode::Bitstream => "bitstream",
        }
    }
}

/// A top-level generic (VHDL) or parameter (Verilog) binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generic {
    pub name: String,
    pub value: String,
}

impl Generic {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Generic {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Generic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl std::str::FromStr for Generic {
    type Err = ValidationError;

    /// Parse `NAME=VALUE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
                Ok(Generic::new(name.trim(), value.trim()))
            }
            _ => Err(ValidationError::invalid(
                Rule::WellFormed,
                "generic",
                s,
                "expected GENERIC=VALUE",
            )),
        }
    }
}

/// A clock period constraint for one top-level port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConstraint {
    pub port: String,
    pub period_ns: f64,
}

impl std::str::FromStr for ClockConstraint {
    type Err = ValidationError;

    /// Parse `PORT=PERIOD_NS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: &str| {
            ValidationError::invalid(Rule::WellFormed, "clock period constraint", s, reason)
        };

        let (port, period) = s
            .split_once('=')
            .ok_or_else(|| malformed("expected PORT=PERIOD_NS"))?;
        let port = port.trim();
        if port.is_empty() {
            return Err(malformed("expected PORT=PERIOD_NS"));
        }
        let period_ns = period
            .trim()
            .parse::<f64>()
            .map_err(|_| malformed("period must be a number of nanoseconds"))?;

        Ok(ClockConstraint {
            port: port.to_string(),
            period_ns,
        })
    }
}

/// Every option of one hdlflow invocation, normalized.
///
/// Built once from the command line (plus configuration), validated once and
/// then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// Backend that runs the flow
    pub tool: Tool,

    /// Design unit under test or to synthesize
    pub top: String,

    /// Source files in compile order
    pub sources: Vec<PathBuf>,

    /// Top-level generics, in the order given
    #[serde(default)]
    pub generics: Vec<Generic>,

    #[serde(default)]
    pub stop_time: Option<StopTime>,

    /// Simulator plusargs without the leading `+` (`NAME` or `NAME=VALUE`)
    #[serde(default)]
    pub plusargs: Vec<String>,

    /// Open the simulator GUI
    #[serde(default)]
    pub gui: bool,

    /// External waveform viewer to launch after the run
    #[serde(default)]
    pub wave_viewer: Option<WaveViewer>,

    /// Saved viewer layout (gtkwave save file, surfer state, Vivado wcfg)
    #[serde(default)]
    pub waveform_view_file: Option<PathBuf>,

    /// cocotb test module
    #[serde(default)]
    pub cocotb_module: Option<String>,

    /// Extra PYTHONPATH entries for cocotb, in order
    #[serde(default)]
    pub pythonpath_entries: Vec<PathBuf>,

    /// libstdc++ to preload for Riviera-PRO
    #[serde(default)]
    pub libstdcpp_path: Option<PathBuf>,

    /// Xilinx `glbl.v` for Riviera-PRO simulations of unisim primitives
    #[serde(default)]
    pub glbl_path: Option<PathBuf>,

    /// Work library name (defaults to `work`)
    #[serde(default)]
    pub default_library: Option<String>,

    #[serde(default)]
    pub synth_mode: SynthMode,

    /// Out-of-context synthesis
    #[serde(default)]
    pub ooc: bool,

    /// Clock port name -> period in nanoseconds
    #[serde(default)]
    pub clk_constraints: BTreeMap<String, f64>,

    /// FPGA part number
    #[serde(default)]
    pub part: Option<String>,

    /// FPGA board part
    #[serde(default)]
    pub board: Option<String>,

    /// Parallel jobs for Vivado runs
    #[serde(default)]
    pub jobs: Option<u32>,
}

impl RequestSpec {
    /// Create a request with every optional setting at its default.
    pub fn new(tool: Tool, top: impl Into<String>, sources: Vec<PathBuf>) -> Self {
        RequestSpec {
            tool,
            top: top.into(),
            sources,
            generics: Vec::new(),
            stop_time: None,
            plusargs: Vec::new(),
            gui: false,
            wave_viewer: None,
            waveform_view_file: None,
            cocotb_module: None,
            pythonpath_entries: Vec::new(),
            libstdcpp_path: None,
            glbl_path: None,
            default_library: None,
            synth_mode: SynthMode::None,
            ooc: false,
            clk_constraints: BTreeMap::new(),
            part: None,
            board: None,
            jobs: None,
        }
    }

    /// Append a generic binding.
    pub fn with_generic(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.generics.push(Generic::new(name, value));
        self
    }

    pub fn with_stop_time(mut self, value: u64, unit: TimeUnit) -> Self {
        self.stop_time = Some(StopTime::new(value, unit));
        self
    }

    /// Append a plusarg. A leading `+` is dropped.
    pub fn with_plusarg(mut self, plusarg: impl Into<String>) -> Self {
        let plusarg = plusarg.into();
        self.plusargs
            .push(plusarg.strip_prefix('+').unwrap_or(&plusarg).to_string());
        self
    }

    pub fn with_gui(mut self, gui: bool) -> Self {
        self.gui = gui;
        self
    }

    pub fn with_wave_viewer(mut self, viewer: WaveViewer) -> Self {
        self.wave_viewer = Some(viewer);
        self
    }

    pub fn with_waveform_view_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.waveform_view_file = Some(path.into());
        self
    }

    pub fn with_cocotb(mut self, module: impl Into<String>) -> Self {
        self.cocotb_module = Some(module.into());
        self
    }

    pub fn with_pythonpath(mut self, path: impl Into<PathBuf>) -> Self {
        self.pythonpath_entries.push(path.into());
        self
    }

    pub fn with_libstdcpp(mut self, path: impl Into<PathBuf>) -> Self {
        self.libstdcpp_path = Some(path.into());
        self
    }

    pub fn with_glbl(mut self, path: impl Into<PathBuf>) -> Self {
        self.glbl_path = Some(path.into());
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.default_library = Some(library.into());
        self
    }

    pub fn with_synth_mode(mut self, mode: SynthMode) -> Self {
        self.synth_mode = mode;
        self
    }

    pub fn with_ooc(mut self, ooc: bool) -> Self {
        self.ooc = ooc;
        self
    }

    /// Add a clock constraint. A repeated port keeps the last period.
    pub fn with_clock(mut self, port: impl Into<String>, period_ns: f64) -> Self {
        self.clk_constraints.insert(port.into(), period_ns);
        self
    }

    pub fn with_part(mut self, part: impl Into<String>) -> Self {
        self.part = Some(part.into());
        self
    }

    pub fn with_board(mut self, board: impl Into<String>) -> Self {
        self.board = Some(board.into());
        self
    }

    pub fn with_jobs(mut self, jobs: u32) -> Self {
        self.jobs = Some(jobs);
        self
    }

    /// Effective work library.
    pub fn library(&self) -> &str {
        self.default_library.as_deref().unwrap_or(DEFAULT_LIBRARY)
    }

    /// Effective Vivado job count.
    pub fn jobs(&self) -> u32 {
        self.jobs.unwrap_or(DEFAULT_JOBS)
    }

    /// Base name for waveform dumps: the top followed by its generics, so
    /// runs with different generics do not overwrite each other.
    ///
    /// Characters other than ASCII letters, digits and `_` in generic values
    /// become `_`, so the stem is always a plain file name.
    pub fn waveform_stem(&self) -> String {
        let mut stem = self.top.clone();
        for generic in &self.generics {
            stem.push('_');
            stem.push_str(&generic.name);
            stem.push('-');
            stem.extend(generic.value.chars().map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            }));
        }
        stem
    }
}
