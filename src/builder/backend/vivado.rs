//! Vivado backend.
//!
//! Vivado runs in project mode. The analyze step creates the project and every
//! later step opens it from its own Tcl script run by `vivado -mode batch`.

use crate::builder::backend::{synth_stages, BackendAdapter};
use crate::builder::plan::{CommandSpec, GeneratedFile, Step, StepKind};
use crate::builder::script::render_clock_constraints;
use crate::builder::script::vivado::{self, Device, ElaborationTarget, Project, CLOCK_CONSTRAINTS_FILE};
use crate::builder::validation::Validated;
use crate::core::request::Tool;

/// Part used when neither a part nor a board is given.
pub const DEFAULT_PART: &str = "xc7a35ticsg324-1L";

#[derive(Debug, Clone, Copy, Default)]
pub struct VivadoBackend;

impl VivadoBackend {
    /// `vivado -mode <mode> -source <script>`.
    fn interpreter(script: &str, interactive: bool) -> CommandSpec {
        let mode = if interactive { "tcl" } else { "batch" };
        CommandSpec::new("vivado").args(["-mode", mode, "-notrace", "-source", script])
    }

    fn script_step(kind: StepKind, description: String, name: &str, contents: String) -> Step {
        let name = format!("{}.tcl", name);
        Step::script(
            kind,
            description,
            Self::interpreter(&name, false),
            GeneratedFile::new(name, contents),
        )
    }

    fn project<'a>(spec: &'a Validated<'_>) -> Project<'a> {
        Project { name: &spec.top }
    }
}

impl BackendAdapter for VivadoBackend {
    fn tool(&self) -> Tool {
        Tool::Vivado
    }

    fn has_native_viewer(&self) -> bool {
        true
    }

    fn build_analyze_steps(&self, spec: &Validated<'_>) -> Vec<Step> {
        let device = match (spec.part.as_deref(), spec.board.as_deref()) {
            (None, None) => Device {
                part: Some(DEFAULT_PART),
                board: None,
            },
            (part, board) => Device { part, board },
        };
        let script =
            vivado::render_project(&Self::project(spec), &device, spec.library(), &spec.sources);

        let step = Self::script_step(
            StepKind::Analyze,
            format!("create project {} with {} source(s)", spec.top, spec.sources.len()),
            "project",
            script,
        )
        .with_sources(spec.sources.iter().cloned());
        vec![step]
    }

    fn build_elaborate_step(&self, spec: &Validated<'_>) -> Step {
        let target = if spec.synth_mode.is_none() {
            ElaborationTarget::Simulation
        } else {
            ElaborationTarget::Synthesis { ooc: spec.ooc }
        };
        let script = vivado::render_elaborate(
            &Self::project(spec),
            &spec.top,
            spec.library(),
            &spec.generics,
            target,
        );
        Self::script_step(
            StepKind::Elaborate,
            format!("elaborate {}", spec.top),
            "elaborate",
            script,
        )
    }

    fn build_run_step(&self, spec: &Validated<'_>) -> Step {
        let script = vivado::render_simulate(
            &Self::project(spec),
            spec.stop_time,
            &spec.plusargs,
            spec.waveform_view_file.as_deref(),
            spec.gui,
        );
        let name = "simulate.tcl";
        Step::script(
            StepKind::Run,
            format!("simulate {}", spec.top),
            // The GUI outlives the script, so the session must stay open
            Self::interpreter(name, spec.gui),
            GeneratedFile::new(name, script),
        )
    }

    fn build_synth_steps(&self, spec: &Validated<'_>) -> Vec<Step> {
        let project = Self::project(spec);
        let jobs = spec.jobs();

        synth_stages(spec.synth_mode)
            .iter()
            .map(|kind| match kind {
                StepKind::Synthesize => {
                    let constrained = !spec.clk_constraints.is_empty();
                    let script = vivado::render_synthesize(&project, spec.ooc, constrained, jobs);
                    let step = Self::script_step(
                        StepKind::Synthesize,
                        format!("synthesize {}", spec.top),
                        "synthesize",
                        script,
                    );
                    if constrained {
                        step.with_support(GeneratedFile::new(
                            CLOCK_CONSTRAINTS_FILE,
                            render_clock_constraints(&spec.clk_constraints),
                        ))
                    } else {
                        step
                    }
                }
                StepKind::Implement => Self::script_step(
                    StepKind::Implement,
                    format!("implement {}", spec.top),
                    "implement",
                    vivado::render_implement(&project, jobs),
                ),
                _ => Self::script_step(
                    StepKind::Bitstream,
                    format!("write bitstream for {}", spec.top),
                    "bitstream",
                    vivado::render_bitstream(&project, jobs),
                ),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::script::extract_clock_constraints;
    use crate::core::request::{RequestSpec, SynthMode};
    use crate::builder::validation::validate;
    use std::path::PathBuf;

    fn alu_request() -> RequestSpec {
        RequestSpec::new(
            Tool::Vivado,
            "alu",
            vec![PathBuf::from("/rtl/alu_pkg.vhd"), PathBuf::from("/rtl/alu.vhd")],
        )
    }

    #[test]
    fn test_default_part() {
        let spec = alu_request();
        let spec = validate(&spec).unwrap();
        let steps = VivadoBackend.build_analyze_steps(&spec);
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].command_spec().display_command(),
            "vivado -mode batch -notrace -source project.tcl"
        );
        assert!(steps[0].script_text().unwrap().contains(DEFAULT_PART));
    }

    #[test]
    fn test_board_without_part_skips_default() {
        let spec = alu_request().with_board("digilentinc.com:basys3:part0:1.2");
        let spec = validate(&spec).unwrap();
        let script = VivadoBackend.build_analyze_steps(&spec)[0]
            .script_text()
            .unwrap()
            .to_string();
        assert!(!script.contains(DEFAULT_PART));
        assert!(script.contains("board_part digilentinc.com:basys3:part0:1.2"));
    }

    #[test]
    fn test_synth_steps_follow_mode() {
        for (mode, expected) in [
            (SynthMode::None, vec![]),
            (SynthMode::Synthesize, vec![StepKind::Synthesize]),
            (
                SynthMode::Bitstream,
                vec![StepKind::Synthesize, StepKind::Implement, StepKind::Bitstream],
            ),
        ] {
            let spec = alu_request().with_synth_mode(mode);
            let spec = validate(&spec).unwrap();
            let kinds: Vec<StepKind> = VivadoBackend
                .build_synth_steps(&spec)
                .iter()
                .map(|s| s.kind)
                .collect();
            assert_eq!(kinds, expected, "mode: {:?}", mode);
        }
    }

    #[test]
    fn test_synthesize_carries_clock_constraints() {
        let spec = alu_request()
            .with_synth_mode(SynthMode::Synthesize)
            .with_ooc(true)
            .with_clock("clk_i", 2.0)
            .with_jobs(8);
        let spec = validate(&spec).unwrap();
        let steps = VivadoBackend.build_synth_steps(&spec);
        let files = steps[0].generated_files();

        assert_eq!(files.len(), 2);
        assert_eq!(files[1].name, CLOCK_CONSTRAINTS_FILE);
        assert_eq!(
            extract_clock_constraints(&files[1].contents),
            spec.clk_constraints
        );
        assert!(files[0].contents.contains("-mode out_of_context"));
        assert!(files[0].contents.contains("launch_runs synth_1 -jobs 8"));
    }

    #[test]
    fn test_elaborate_target_follows_mode() {
        let spec = alu_request();
        let spec = validate(&spec).unwrap();
        let step = VivadoBackend.build_elaborate_step(&spec);
        assert!(step.script_text().unwrap().contains("launch_simulation -step elaborate"));

        let spec = alu_request().with_synth_mode(SynthMode::Implement);
        let spec = validate(&spec).unwrap();
        let step = VivadoBackend.build_elaborate_step(&spec);
        assert!(step.script_text().unwrap().contains("synth_design -rtl -name rtl_1"));
    }

    #[test]
    fn test_run_passes_plusargs_to_xsim() {
        let spec = alu_request().with_plusarg("seed=7");
        let spec = validate(&spec).unwrap();
        let script = VivadoBackend.build_run_step(&spec)
            .script_text()
            .unwrap()
            .to_string();
        assert!(script.contains("-value {-testplusarg seed=7}"));
    }

    #[test]
    fn test_gui_run_keeps_session() {
        let spec = alu_request().with_gui(true);
        let spec = validate(&spec).unwrap();
        let step = VivadoBackend.build_run_step(&spec);
        assert_eq!(
            step.command_spec().display_command(),
            "vivado -mode tcl -notrace -source simulate.tcl"
        );
        assert!(VivadoBackend.build_waveform_step(&spec).is_none());
    }
}
