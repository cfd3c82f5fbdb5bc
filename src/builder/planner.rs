//! Request to plan translation.
//!
//! `CommandPlanner` validates a request, picks the backend for its tool and
//! asks it for the steps of the flow in a fixed order:
//!
//! 1. analyze (one step per source or one batched step)
//! 2. elaborate
//! 3. run, or the synthesis prefix selected by the synthesis mode
//! 4. launch_waveform, when an external viewer applies
//!
//! Planning never touches the filesystem and never starts a process.

use miette::Diagnostic;
use thiserror::Error;

use crate::builder::backend::{Backend, BackendAdapter};
use crate::builder::plan::{Plan, StepKind};
use crate::builder::validation::{validate, ValidationError};
use crate::core::request::RequestSpec;

/// Why no plan was produced.
#[derive(Debug, Error, Diagnostic)]
pub enum PlanError {
    /// The request breaks a validation rule.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// A backend produced steps out of order.
    #[error("internal planning error: {0}")]
    #[diagnostic(code(hdlflow::plan::internal))]
    Internal(String),
}

/// Builds plans from requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandPlanner;

impl CommandPlanner {
    pub fn new() -> Self {
        CommandPlanner
    }

    /// Validate `spec` and translate it into a plan.
    pub fn plan(&self, spec: &RequestSpec) -> Result<Plan, PlanError> {
        let spec = validate(spec)?;
        let backend = Backend::for_tool(spec.tool);
        let adapter = backend.adapter();

        let mut steps = adapter.build_analyze_steps(&spec);
        steps.push(adapter.build_elaborate_step(&spec));

        if spec.synth_mode.is_none() {
            steps.push(adapter.build_run_step(&spec));
        } else {
            steps.extend(adapter.build_synth_steps(&spec));
        }

        if let Some(waveform) = adapter.build_waveform_step(&spec) {
            steps.push(waveform);
        }

        let plan = Plan {
            tool: spec.tool,
            top: spec.top.clone(),
            output_dir: Plan::output_dir_for(spec.tool),
            steps,
        };
        check_order(&plan)?;

        tracing::debug!(
            "planned {} step(s) for {}: {:?}",
            plan.steps.len(),
            plan.tool,
            plan.kinds()
        );
        Ok(plan)
    }
}

/// Convenience wrapper around [`CommandPlanner::plan`].
pub fn plan(spec: &RequestSpec) -> Result<Plan, PlanError> {
    CommandPlanner::new().plan(spec)
}

fn stage(kind: StepKind) -> u8 {
    match kind {
        StepKind::Analyze => 0,
        StepKind::Elaborate => 1,
        StepKind::Run | StepKind::Synthesize => 2,
        StepKind::Implement => 3,
        StepKind::Bitstream => 4,
        StepKind::LaunchWaveform => 5,
    }
}

/// Check the plan shape: analyze steps first, exactly one elaborate, then
/// either a run or a synthesis prefix, then at most one viewer.
fn check_order(plan: &Plan) -> Result<(), PlanError> {
    let kinds = plan.kinds();
    let count = |kind: StepKind| kinds.iter().filter(|k| **k == kind).count();

    if count(StepKind::Analyze) == 0 {
        return Err(PlanError::Internal("plan has no analyze step".to_string()));
    }
    if count(StepKind::Elaborate) != 1 {
        return Err(PlanError::Internal(format!(
            "plan must elaborate exactly once, got {:?}",
            kinds
        )));
    }
    if count(StepKind::Run) > 0 && count(StepKind::Synthesize) > 0 {
        return Err(PlanError::Internal(
            "plan both simulates and synthesizes".to_string(),
        ));
    }
    for kind in [
        StepKind::Run,
        StepKind::Synthesize,
        StepKind::Implement,
        StepKind::Bitstream,
        StepKind::LaunchWaveform,
    ] {
        if count(kind) > 1 {
            return Err(PlanError::Internal(format!("plan repeats {} step", kind)));
        }
    }
    if count(StepKind::Bitstream) > count(StepKind::Implement)
        || count(StepKind::Implement) > count(StepKind::Synthesize)
    {
        return Err(PlanError::Internal(format!(
            "synthesis steps are not a prefix: {:?}",
            kinds
        )));
    }
    if kinds.windows(2).any(|w| stage(w[0]) > stage(w[1])) {
        return Err(PlanError::Internal(format!(
            "steps out of order: {:?}",
            kinds
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::plan::{CommandSpec, Step};
    use crate::builder::script::extract_clock_constraints;
    use crate::builder::validation::Rule;
    use crate::core::request::{SynthMode, Tool, WaveViewer};
    use std::path::PathBuf;

    fn sources(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_nvc_simulation_plan() {
        let spec = RequestSpec::new(Tool::Nvc, "adder_tb", sources(&["a.src", "b.src"]))
            .with_generic("WIDTH", "8");
        let plan = plan(&spec).unwrap();

        assert_eq!(
            plan.kinds(),
            vec![
                StepKind::Analyze,
                StepKind::Analyze,
                StepKind::Elaborate,
                StepKind::Run
            ]
        );
        assert_eq!(plan.steps[0].sources, sources(&["a.src"]));
        assert_eq!(plan.steps[1].sources, sources(&["b.src"]));

        let elaborate = plan.step(StepKind::Elaborate).unwrap().command_spec();
        assert!(elaborate.args.contains(&"-gWIDTH=8".to_string()));
        assert_eq!(elaborate.args.last().map(String::as_str), Some("adder_tb"));
        assert_eq!(plan.output_dir(), std::path::Path::new("nvc"));
    }

    #[test]
    fn test_vivado_rejects_cocotb() {
        let spec = RequestSpec::new(Tool::Vivado, "adder_tb", sources(&["adder_tb.vhd"]))
            .with_cocotb("adder_tb");
        let err = plan(&spec).unwrap_err();
        match err {
            PlanError::Validation(err) => {
                assert_eq!(err.rule(), Rule::CocotbBackend);
                assert!(err.is_unsupported_combination());
                assert_eq!(err.value(), "adder_tb");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_vivado_bitstream_plan() {
        let spec = RequestSpec::new(Tool::Vivado, "alu", sources(&["/rtl/alu.vhd"]))
            .with_synth_mode(SynthMode::Bitstream)
            .with_ooc(true)
            .with_clock("clk_i", 2.0);
        let plan = plan(&spec).unwrap();

        assert_eq!(
            plan.kinds(),
            vec![
                StepKind::Analyze,
                StepKind::Elaborate,
                StepKind::Synthesize,
                StepKind::Implement,
                StepKind::Bitstream
            ]
        );
        assert!(plan.step(StepKind::Run).is_none());

        let project = plan.step(StepKind::Analyze).unwrap().script_text().unwrap();
        assert!(project.contains("-part xc7a35ticsg324-1L"));

        let xdc = plan
            .generated_files()
            .into_iter()
            .find(|f| f.name == "clocks.xdc")
            .unwrap();
        let clocks = extract_clock_constraints(&xdc.contents);
        assert_eq!(clocks.get("clk_i"), Some(&2.0));
    }

    #[test]
    fn test_riviera_waveform_after_run() {
        let spec = RequestSpec::new(Tool::Riviera, "top_tb", sources(&["/rtl/top_tb.vhd"]))
            .with_wave_viewer(WaveViewer::Gtkwave)
            .with_waveform_view_file("v.view");
        let plan = plan(&spec).unwrap();

        let kinds = plan.kinds();
        assert_eq!(kinds.last(), Some(&StepKind::LaunchWaveform));
        assert_eq!(kinds[kinds.len() - 2], StepKind::Run);

        let waves = plan.step(StepKind::LaunchWaveform).unwrap();
        assert!(waves.command_spec().args.contains(&"v.view".to_string()));
    }

    #[test]
    fn test_planning_is_pure() {
        let spec = RequestSpec::new(Tool::Riviera, "fifo_tb", sources(&["/a.vhd", "/fifo_tb.sv"]))
            .with_generic("DEPTH", "16")
            .with_cocotb("test_fifo")
            .with_wave_viewer(WaveViewer::Surfer);
        assert_eq!(plan(&spec).unwrap(), plan(&spec).unwrap());
    }

    #[test]
    fn test_analyzed_sources_match_request() {
        let files = sources(&["/z.vhd", "/m.vhd", "/a.vhd"]);
        for tool in Tool::ALL {
            let spec = RequestSpec::new(tool, "a", files.clone());
            let plan = plan(&spec).unwrap();
            let analyzed: Vec<PathBuf> = plan
                .analyzed_sources()
                .into_iter()
                .map(PathBuf::from)
                .collect();
            assert_eq!(analyzed, files, "tool: {}", tool);
        }
    }

    #[test]
    fn test_simulation_never_synthesizes() {
        for tool in Tool::ALL {
            let spec = RequestSpec::new(tool, "top", sources(&["/top.vhd"]));
            let kinds = plan(&spec).unwrap().kinds();
            assert!(kinds.contains(&StepKind::Run));
            assert!(!kinds.contains(&StepKind::Synthesize));
        }
    }

    #[test]
    fn test_check_order_rejects_misordered_plan() {
        let step = |kind| Step::command(kind, "x", CommandSpec::new("nvc"));
        let plan = Plan {
            tool: Tool::Nvc,
            top: "top".to_string(),
            output_dir: Plan::output_dir_for(Tool::Nvc),
            steps: vec![
                step(StepKind::Analyze),
                step(StepKind::Run),
                step(StepKind::Elaborate),
            ],
        };
        assert!(matches!(check_order(&plan), Err(PlanError::Internal(_))));

        let plan = Plan {
            steps: vec![
                step(StepKind::Analyze),
                step(StepKind::Elaborate),
                step(StepKind::Implement),
            ],
            ..plan
        };
        assert!(matches!(check_order(&plan), Err(PlanError::Internal(_))));
    }
}
