//! nvc backend.
//!
//! Every step is a direct `nvc` invocation; nothing is generated on disk.

use crate::builder::backend::BackendAdapter;
use crate::builder::plan::{CocotbHook, CommandSpec, GpiBinding, GpiInterface, Step, StepKind};
use crate::builder::script::generic_words;
use crate::builder::validation::Validated;
use crate::core::request::Tool;

#[derive(Debug, Clone, Copy, Default)]
pub struct NvcBackend;

impl NvcBackend {
    fn nvc(&self, spec: &Validated<'_>) -> CommandSpec {
        CommandSpec::new("nvc").arg(format!("--work={}", spec.library()))
    }
}

impl BackendAdapter for NvcBackend {
    fn tool(&self) -> Tool {
        Tool::Nvc
    }

    fn has_native_viewer(&self) -> bool {
        false
    }

    fn build_analyze_steps(&self, spec: &Validated<'_>) -> Vec<Step> {
        spec.sources
            .iter()
            .map(|source| {
                let cmd = self.nvc(spec).arg("-a").arg(source.display().to_string());
                Step::command(
                    StepKind::Analyze,
                    format!("analyze {}", source.display()),
                    cmd,
                )
                .with_sources([source.clone()])
            })
            .collect()
    }

    fn build_elaborate_step(&self, spec: &Validated<'_>) -> Step {
        let cmd = self
            .nvc(spec)
            .args(["-e", "-j"])
            .args(generic_words("-g", &spec.generics))
            .arg(spec.top.as_str());
        Step::command(StepKind::Elaborate, format!("elaborate {}", spec.top), cmd)
    }

    fn build_run_step(&self, spec: &Validated<'_>) -> Step {
        if spec.gui {
            tracing::warn!("nvc has no GUI, ignoring --gui");
        }

        let mut cmd = self
            .nvc(spec)
            .args(["-r", spec.top.as_str(), "--ieee-warnings=off", "--dump-arrays"]);

        if let Some(stop) = spec.stop_time {
            cmd = cmd.arg(format!("--stop-time={}{}", stop.value, stop.unit.as_str()));
        }
        if let Some(dump) = self.waveform_dump(spec) {
            cmd = cmd.args(["--format=fst".to_string(), format!("--wave={}", dump)]);
        }
        cmd = cmd.args(spec.plusargs.iter().map(|p| format!("+{}", p)));

        let mut step = Step::command(StepKind::Run, format!("simulate {}", spec.top), cmd);
        if let Some(module) = &spec.cocotb_module {
            step = step.with_cocotb(CocotbHook {
                module: module.clone(),
                toplevel: spec.top.clone(),
                simulator: "nvc".to_string(),
                interface: GpiInterface::Vhpi,
                entry_point: None,
                binding: GpiBinding::Argument {
                    flag: "--load".to_string(),
                },
                extra_interface: None,
                pythonpath: spec.pythonpath_entries.clone(),
            });
        }
        step
    }

    fn waveform_dump(&self, spec: &Validated<'_>) -> Option<String> {
        spec.wave_viewer
            .map(|_| format!("{}.fst", spec.waveform_stem()))
    }
}
