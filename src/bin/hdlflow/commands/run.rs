//! `hdlflow <eda_tool> <top> <path_to_compile_order>`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::Cli;
use hdlflow::builder::planner::{self, PlanError};
use hdlflow::builder::ValidationError;
use hdlflow::core::compile_order::{read_compile_order, resolve_path};
use hdlflow::core::request::{
    ClockConstraint, Generic, RequestSpec, StopTime, SynthMode, Tool, WaveViewer,
};
use hdlflow::ops::{self, ExecuteOptions};
use hdlflow::util::config::{global_config_path, load_config, project_config_path};
use hdlflow::util::diagnostic::{self, Diagnostic};
use hdlflow::util::{ColorChoice, Shell};

pub fn execute(cli: Cli) -> Result<()> {
    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let shell = Shell::new(color);
    let cwd = std::env::current_dir().context("failed to get current directory")?;

    let spec = match build_request(&cli, &cwd) {
        Ok(spec) => spec,
        Err(e) => match e.downcast_ref::<ValidationError>() {
            Some(err) => reject(err, &shell),
            None => return Err(e),
        },
    };

    let plan = match planner::plan(&spec) {
        Ok(plan) => plan,
        Err(PlanError::Validation(err)) => reject(&err, &shell),
        Err(e) => return Err(e.into()),
    };

    if cli.plan {
        let json = serde_json::to_string_pretty(&plan).context("failed to serialize plan")?;
        println!("{}", json);
        return Ok(());
    }

    ops::execute(&plan, &ExecuteOptions { cwd }, &shell)
}

/// Report a rejected request and exit before any tool starts.
fn reject(err: &ValidationError, shell: &Shell) -> ! {
    diagnostic::emit(&Diagnostic::from_validation(err), shell.use_color());
    std::process::exit(1);
}

/// Build the request from the command line, then fill unset values from
/// configuration.
fn build_request(cli: &Cli, cwd: &Path) -> Result<RequestSpec> {
    let tool: Tool = cli.eda_tool.parse()?;
    let sources = read_compile_order(&cli.path_to_compile_order, cwd)?;
    tracing::debug!("{} source(s) in compile order", sources.len());

    let mut spec = RequestSpec::new(tool, cli.top.as_str(), sources)
        .with_gui(cli.gui)
        .with_ooc(cli.ooc)
        .with_synth_mode(SynthMode::from_flags(cli.synth, cli.implement, cli.bitstream));

    for generic in &cli.generics {
        spec.generics.push(generic.parse::<Generic>()?);
    }
    for plusarg in &cli.plusargs {
        spec = spec.with_plusarg(plusarg.as_str());
    }
    for constraint in &cli.clk_period_constraints {
        let clock: ClockConstraint = constraint.parse()?;
        spec = spec.with_clock(clock.port, clock.period_ns);
    }
    if let Some([value, unit]) = cli.stop_time.as_deref() {
        spec.stop_time = Some(StopTime::parse(value, unit)?);
    }

    spec.wave_viewer = cli.wave.as_deref().map(str::parse::<WaveViewer>).transpose()?;
    // Steps run inside the output directory, so user paths must not stay relative
    let resolve = |path: &Option<PathBuf>| path.as_deref().map(|p| resolve_path(p, cwd));
    spec.waveform_view_file = resolve(&cli.waveform_view_file);
    spec.cocotb_module = cli.cocotb.clone();
    spec.pythonpath_entries = cli.pythonpaths.clone();
    spec.libstdcpp_path = resolve(&cli.libstdcpp);
    spec.glbl_path = resolve(&cli.glbl);
    spec.default_library = cli.work.clone();
    spec.part = cli.part.clone();
    spec.board = cli.board.clone();
    spec.jobs = cli.jobs;

    let config = load_config(global_config_path().as_deref(), &project_config_path(cwd));
    config.apply_to(&mut spec);

    Ok(spec)
}
