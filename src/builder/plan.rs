//! Execution plans.
//!
//! A `Plan` is the ordered list of tool invocations for one request. Each
//! step either runs a command directly or hands a generated script to an
//! interpreter (`vsimsa -do`, `vivado -source`). Steps run one after another
//! inside the plan's output directory; a step may rely on anything its
//! predecessors left there (compiled libraries, the Vivado project).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::request::Tool;

/// File cocotb writes its JUnit results to, relative to the output directory.
pub const COCOTB_RESULTS_FILE: &str = "results.xml";

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Analyze,
    Elaborate,
    Run,
    LaunchWaveform,
    Synthesize,
    Implement,
    Bitstream,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Analyze => "analyze",
            StepKind::Elaborate => "elaborate",
            StepKind::Run => "run",
            StepKind::LaunchWaveform => "launch_waveform",
            StepKind::Synthesize => "synthesize",
            StepKind::Implement => "implement",
            StepKind::Bitstream => "bitstream",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to run, looked up on PATH
    pub program: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set, in insertion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render as a shell-like command line for display.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// A text file produced by planning and written into the output directory
/// before its step runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// File name, relative to the output directory
    pub name: String,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        GeneratedFile {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// How a step invokes its tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepPayload {
    /// Run a command directly
    Command(CommandSpec),
    /// Write a script (plus support files) and run an interpreter on it
    Script {
        interpreter: CommandSpec,
        script: GeneratedFile,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        support: Vec<GeneratedFile>,
    },
}

/// A VHDL or Verilog procedural interface cocotb attaches through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpiInterface {
    Vhpi,
    Vpi,
}

impl GpiInterface {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpiInterface::Vhpi => "vhpi",
            GpiInterface::Vpi => "vpi",
        }
    }

    /// Entry point used when the interface is loaded through `GPI_EXTRA`.
    pub fn extra_entry_point(&self) -> &'static str {
        match self {
            GpiInterface::Vhpi => "cocotbvhpi_entry_point",
            GpiInterface::Vpi => "cocotbvpi_entry_point",
        }
    }
}

/// How the primary cocotb GPI library reaches the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum GpiBinding {
    /// Appended to the command as `<flag> <library>`
    Argument { flag: String },
    /// Exported in an environment variable the generated script reads
    EnvVar { name: String },
}

/// cocotb settings of a run step.
///
/// Library locations and the cocotb version are only known on the machine
/// that runs the plan, so they are resolved by the execution layer
/// (through `cocotb-config`) rather than baked into the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocotbHook {
    /// Python test module
    pub module: String,
    /// Top-level design unit
    pub toplevel: String,
    /// Simulator name as cocotb-config knows it
    pub simulator: String,
    /// Interface the primary GPI library is loaded through
    pub interface: GpiInterface,
    /// Entry point appended to the primary library (`lib:entry`)
    pub entry_point: Option<String>,
    pub binding: GpiBinding,
    /// Second interface for mixed-language designs, exported as `GPI_EXTRA`
    pub extra_interface: Option<GpiInterface>,
    /// PYTHONPATH entries, prepended to any inherited value
    pub pythonpath: Vec<PathBuf>,
}

/// One tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub kind: StepKind,
    /// Human-readable summary for status output
    pub description: String,
    pub payload: StepPayload,
    /// Source files this step analyzes, in compile order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cocotb: Option<CocotbHook>,
}

impl Step {
    /// A step that runs a command directly.
    pub fn command(kind: StepKind, description: impl Into<String>, command: CommandSpec) -> Self {
        Step {
            kind,
            description: description.into(),
            payload: StepPayload::Command(command),
            sources: Vec::new(),
            cocotb: None,
        }
    }

    /// A step that runs `interpreter` on a generated script.
    pub fn script(
        kind: StepKind,
        description: impl Into<String>,
        interpreter: CommandSpec,
        script: GeneratedFile,
    ) -> Self {
        Step {
            kind,
            description: description.into(),
            payload: StepPayload::Script {
                interpreter,
                script,
                support: Vec::new(),
            },
            sources: Vec::new(),
            cocotb: None,
        }
    }

    /// Record the sources this step analyzes.
    pub fn with_sources(mut self, sources: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.sources = sources.into_iter().map(|s| s.into()).collect();
        self
    }

    /// Attach a support file to a script step. Command steps ignore it.
    pub fn with_support(mut self, file: GeneratedFile) -> Self {
        if let StepPayload::Script { support, .. } = &mut self.payload {
            support.push(file);
        }
        self
    }

    pub fn with_cocotb(mut self, hook: CocotbHook) -> Self {
        self.cocotb = Some(hook);
        self
    }

    /// The command that starts this step.
    pub fn command_spec(&self) -> &CommandSpec {
        match &self.payload {
            StepPayload::Command(cmd) => cmd,
            StepPayload::Script { interpreter, .. } => interpreter,
        }
    }

    /// Generated files that must exist before this step runs.
    pub fn generated_files(&self) -> Vec<&GeneratedFile> {
        match &self.payload {
            StepPayload::Command(_) => Vec::new(),
            StepPayload::Script {
                script, support, ..
            } => std::iter::once(script).chain(support.iter()).collect(),
        }
    }

    /// The generated script text, if this is a script step.
    pub fn script_text(&self) -> Option<&str> {
        match &self.payload {
            StepPayload::Command(_) => None,
            StepPayload::Script { script, .. } => Some(&script.contents),
        }
    }
}

/// A complete execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub tool: Tool,
    pub top: String,
    /// Directory all steps run in, relative to the invocation directory
    pub output_dir: PathBuf,
    /// All steps in execution order
    pub steps: Vec<Step>,
}

impl Plan {
    /// Output directory for a tool: a directory named after it.
    pub fn output_dir_for(tool: Tool) -> PathBuf {
        PathBuf::from(tool.as_str())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Step kinds in execution order.
    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|s| s.kind).collect()
    }

    /// Sources referenced by analyze steps, in execution order.
    pub fn analyzed_sources(&self) -> Vec<&Path> {
        self.steps
            .iter()
            .filter(|s| s.kind == StepKind::Analyze)
            .flat_map(|s| s.sources.iter().map(|p| p.as_path()))
            .collect()
    }

    /// First step of the given kind.
    pub fn step(&self, kind: StepKind) -> Option<&Step> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// Every generated file, in step order.
    pub fn generated_files(&self) -> Vec<&GeneratedFile> {
        self.steps.iter().flat_map(|s| s.generated_files()).collect()
    }

    /// Distinct programs the plan invokes, in first-use order.
    pub fn programs(&self) -> Vec<&str> {
        let mut programs: Vec<&str> = Vec::new();
        for step in &self.steps {
            let program = step.command_spec().program.as_str();
            if !programs.contains(&program) {
                programs.push(program);
            }
        }
        programs
    }

    /// Whether any step needs cocotb.
    pub fn uses_cocotb(&self) -> bool {
        self.steps.iter().any(|s| s.cocotb.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> Plan {
        Plan {
            tool: Tool::Riviera,
            top: "top".to_string(),
            output_dir: Plan::output_dir_for(Tool::Riviera),
            steps: vec![
                Step::script(
                    StepKind::Analyze,
                    "compile 2 sources",
                    CommandSpec::new("vsimsa").args(["-do", "compile.do"]),
                    GeneratedFile::new("compile.do", "alib work\n"),
                )
                .with_sources(["/a.vhd", "/b.vhd"]),
                Step::command(
                    StepKind::LaunchWaveform,
                    "open waves",
                    CommandSpec::new("gtkwave").arg("top.vcd"),
                ),
            ],
        }
    }

    #[test]
    fn test_command_spec_builder() {
        let cmd = CommandSpec::new("nvc")
            .arg("-a")
            .args(["x.vhd", "y.vhd"])
            .env("LD_PRELOAD", "/lib/libstdc++.so.6");
        assert_eq!(cmd.display_command(), "nvc -a x.vhd y.vhd");
        assert_eq!(cmd.env.len(), 1);
    }

    #[test]
    fn test_plan_queries() {
        let plan = sample_plan();
        assert_eq!(plan.output_dir(), Path::new("riviera"));
        assert_eq!(plan.kinds(), vec![StepKind::Analyze, StepKind::LaunchWaveform]);
        assert_eq!(
            plan.analyzed_sources(),
            vec![Path::new("/a.vhd"), Path::new("/b.vhd")]
        );
        assert_eq!(plan.programs(), vec!["vsimsa", "gtkwave"]);
        assert_eq!(plan.generated_files().len(), 1);
        assert!(!plan.uses_cocotb());
        assert_eq!(plan.steps.len(), 2);
    }

    #[test]
    fn test_support_files_only_attach_to_scripts() {
        let script = Step::script(
            StepKind::Synthesize,
            "synthesize",
            CommandSpec::new("vivado"),
            GeneratedFile::new("synthesize.tcl", ""),
        )
        .with_support(GeneratedFile::new("clocks.xdc", ""));
        assert_eq!(script.generated_files().len(), 2);

        let command = Step::command(StepKind::Run, "run", CommandSpec::new("nvc"))
            .with_support(GeneratedFile::new("ignored.txt", ""));
        assert!(command.generated_files().is_empty());
        assert!(command.script_text().is_none());
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let json = serde_json::to_string(&sample_plan()).unwrap();
        assert!(json.contains("\"tool\":\"riviera\""));
        assert!(json.contains("\"kind\":\"analyze\""));
        assert!(json.contains("\"type\":\"script\""));
        assert!(json.contains("\"kind\":\"launch_waveform\""));
        // Empty collections are omitted
        assert!(!json.contains("\"support\""));
    }
}
