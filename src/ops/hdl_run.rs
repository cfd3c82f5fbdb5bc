//! Plan execution.
//!
//! Runs the steps of a plan one after another inside the plan's output
//! directory. The first failing step stops the run; nothing is retried.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::builder::plan::{Plan, Step, COCOTB_RESULTS_FILE};
use crate::ops::cocotb::{self, CocotbRuntime, COCOTB_CONFIG};
use crate::util::diagnostic::{self, suggestions, Diagnostic};
use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Options for executing a plan.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Invocation directory; the output directory is created below it
    pub cwd: PathBuf,
}

/// Programs the plan needs that are not on PATH, in first-use order.
pub fn missing_programs(plan: &Plan) -> Vec<String> {
    let mut programs: Vec<&str> = plan.programs();
    if plan.uses_cocotb() {
        programs.push(COCOTB_CONFIG);
    }

    programs
        .into_iter()
        .filter(|program| find_executable(program).is_none())
        .map(String::from)
        .collect()
}

/// Fail when any program the plan needs is missing.
pub fn check_dependencies(plan: &Plan) -> Result<()> {
    let missing = missing_programs(plan);
    if missing.is_empty() {
        return Ok(());
    }

    let diag = Diagnostic::error(format!("missing dependencies: {}", missing.join(", ")))
        .with_context("all dependencies must be found on PATH")
        .with_suggestion(suggestions::MISSING_TOOL);
    bail!("{}", diag.format(false).trim_end())
}

/// Write every generated file of `step` into `dir`.
fn write_generated_files(step: &Step, dir: &Path) -> Result<()> {
    for file in step.generated_files() {
        let path = dir.join(&file.name);
        std::fs::write(&path, &file.contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!("wrote {}", path.display());
    }
    Ok(())
}

/// Execute a plan.
pub fn execute(plan: &Plan, opts: &ExecuteOptions, shell: &Shell) -> Result<()> {
    check_dependencies(plan)?;

    let out_dir = opts.cwd.join(plan.output_dir());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create directory: {}", out_dir.display()))?;
    shell.status(Status::Created, format!("output directory {}", out_dir.display()));

    let runtime = if plan.uses_cocotb() {
        Some(CocotbRuntime::detect()?)
    } else {
        None
    };

    for step in &plan.steps {
        write_generated_files(step, &out_dir)?;

        let mut process = ProcessBuilder::from_spec(step.command_spec()).cwd(&out_dir);
        if let (Some(hook), Some(runtime)) = (&step.cocotb, &runtime) {
            process = cocotb::apply_hook(process, hook, runtime, &opts.cwd)?;
        }

        shell.status(Status::for_step(step.kind), &step.description);
        tracing::debug!("{}", process.display_command());

        let status = process.status()?;
        if !status.success() {
            shell.status(Status::Error, format!("{} step failed", step.kind));
            bail!(
                "`{}` failed with exit code {:?}\nhelp: {}",
                process.display_command(),
                status.code(),
                suggestions::STEP_FAILED
            );
        }

        if step.cocotb.is_some() {
            check_cocotb_results(&out_dir.join(COCOTB_RESULTS_FILE), shell)?;
        }
    }

    shell.status(
        Status::Finished,
        format!("{} for {} in {}", plan.tool, plan.top, out_dir.display()),
    );
    Ok(())
}

fn check_cocotb_results(path: &Path, shell: &Shell) -> Result<()> {
    if !path.exists() {
        let diag = Diagnostic::warning(format!("no cocotb results at {}", path.display()))
            .with_context("the simulator exited without cocotb writing a report")
            .with_suggestion(suggestions::COCOTB_NO_RESULTS);
        diagnostic::emit(&diag, shell.use_color());
        return Ok(());
    }
    if !cocotb::results_passed(path)? {
        bail!("cocotb tests failed, see {}", path.display());
    }
    Ok(())
}
