//! Backend adapters.
//!
//! Each supported tool has an adapter that turns a validated request into the
//! steps of its flow. Adapters only translate: they never check compatibility
//! (that already happened in `builder::validation`) and never touch the
//! filesystem or spawn processes.

use crate::builder::plan::{CommandSpec, GeneratedFile, Step, StepKind};
use crate::builder::script::render_surfer_commands;
use crate::builder::validation::Validated;
use crate::core::request::{SynthMode, Tool, WaveViewer};

pub mod nvc;
pub mod riviera;
pub mod vivado;

pub use nvc::NvcBackend;
pub use riviera::RivieraBackend;
pub use vivado::VivadoBackend;

/// Command file surfer runs when no saved state is given.
pub const SURFER_COMMAND_FILE: &str = "commands.txt";

/// Translates a validated request into steps for one tool.
pub trait BackendAdapter {
    /// The tool this adapter drives.
    fn tool(&self) -> Tool;

    /// Whether the tool shows waveforms itself rather than through an
    /// external viewer.
    fn has_native_viewer(&self) -> bool;

    /// Steps that compile the sources into the work library, in order.
    fn build_analyze_steps(&self, spec: &Validated<'_>) -> Vec<Step>;

    fn build_elaborate_step(&self, spec: &Validated<'_>) -> Step;

    /// The simulation run.
    fn build_run_step(&self, spec: &Validated<'_>) -> Step;

    /// Waveform dump the run step writes for an external viewer, if any.
    fn waveform_dump(&self, _spec: &Validated<'_>) -> Option<String> {
        None
    }

    /// Step launching the requested external viewer on the run's dump.
    /// Tools with their own viewer never get one.
    fn build_waveform_step(&self, spec: &Validated<'_>) -> Option<Step> {
        if self.has_native_viewer() {
            return None;
        }
        let viewer = spec.wave_viewer?;
        let dump = self.waveform_dump(spec)?;
        Some(external_viewer_step(spec, viewer, &dump))
    }

    /// Synthesis, implementation and bitstream steps up to the requested
    /// mode. Tools without an FPGA flow return nothing.
    fn build_synth_steps(&self, _spec: &Validated<'_>) -> Vec<Step> {
        Vec::new()
    }
}

/// Adapter selected by tool.
#[derive(Debug, Clone, Copy)]
pub enum Backend {
    Nvc(NvcBackend),
    Riviera(RivieraBackend),
    Vivado(VivadoBackend),
}

impl Backend {
    pub fn for_tool(tool: Tool) -> Self {
        match tool {
            Tool::Nvc => Backend::Nvc(NvcBackend),
            Tool::Riviera => Backend::Riviera(RivieraBackend),
            Tool::Vivado => Backend::Vivado(VivadoBackend),
        }
    }

    pub fn adapter(&self) -> &dyn BackendAdapter {
        match self {
            Backend::Nvc(b) => b,
            Backend::Riviera(b) => b,
            Backend::Vivado(b) => b,
        }
    }
}

/// Step kinds of the FPGA flow for a synthesis mode, in order.
pub fn synth_stages(mode: SynthMode) -> &'static [StepKind] {
    match mode {
        SynthMode::None => &[],
        SynthMode::Synthesize => &[StepKind::Synthesize],
        SynthMode::Implement => &[StepKind::Synthesize, StepKind::Implement],
        SynthMode::Bitstream => &[
            StepKind::Synthesize,
            StepKind::Implement,
            StepKind::Bitstream,
        ],
    }
}

/// Viewer invocation for a waveform dump.
///
/// gtkwave opens the dump with a save file (the view file, or `<stem>.gtkw`
/// next to the dump). surfer restores a saved state when a view file is
/// given; otherwise it runs a generated command file that groups the design
/// signals and saves a fresh state.
pub fn external_viewer_step(spec: &Validated<'_>, viewer: WaveViewer, dump: &str) -> Step {
    let description = format!("open {} in {}", dump, viewer);
    let view_file = spec
        .waveform_view_file
        .as_ref()
        .map(|p| p.display().to_string());

    match viewer {
        WaveViewer::Gtkwave => {
            let save = view_file.unwrap_or_else(|| format!("{}.gtkw", spec.waveform_stem()));
            let cmd = CommandSpec::new(viewer.as_str()).args([dump, "-a", save.as_str()]);
            Step::command(StepKind::LaunchWaveform, description, cmd)
        }
        WaveViewer::Surfer => match view_file {
            Some(state) => {
                let cmd = CommandSpec::new(viewer.as_str()).args([dump, "-s", state.as_str()]);
                Step::command(StepKind::LaunchWaveform, description, cmd)
            }
            None => {
                let cmd = CommandSpec::new(viewer.as_str()).args([dump, "-c", SURFER_COMMAND_FILE]);
                Step::script(
                    StepKind::LaunchWaveform,
                    description,
                    cmd,
                    GeneratedFile::new(SURFER_COMMAND_FILE, render_surfer_commands(&spec.top)),
                )
            }
        },
    }
}
