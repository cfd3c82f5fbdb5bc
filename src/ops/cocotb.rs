//! cocotb runtime wiring.
//!
//! Plans only say that a step hosts cocotb. The library paths, the Python
//! runtime and the cocotb version differ per machine, so they are read from
//! `cocotb-config` right before the step runs.

use std::path::Path;

use anyhow::{bail, Context, Result};
use semver::Version;

use crate::builder::plan::{CocotbHook, GpiBinding, GpiInterface, COCOTB_RESULTS_FILE};
use crate::util::process::ProcessBuilder;

/// Helper program shipped with cocotb.
pub const COCOTB_CONFIG: &str = "cocotb-config";

/// Python and cocotb installation on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CocotbRuntime {
    pub version: Version,
    /// `libpython` the GPI loads
    pub libpython: String,
    /// Interpreter for cocotb 2 and later
    pub python_bin: Option<String>,
}

impl CocotbRuntime {
    /// Query `cocotb-config` for the installed runtime.
    pub fn detect() -> Result<Self> {
        let version = parse_version(&cocotb_config(&["--version"])?)?;
        let libpython = cocotb_config(&["--libpython"])?;
        let python_bin = if version.major >= 2 {
            Some(cocotb_config(&["--python-bin"])?)
        } else {
            None
        };

        tracing::info!("using cocotb {}", version);
        Ok(CocotbRuntime {
            version,
            libpython,
            python_bin,
        })
    }
}

fn cocotb_config(args: &[&str]) -> Result<String> {
    ProcessBuilder::new(COCOTB_CONFIG)
        .args(args)
        .exec_and_check()
        .with_context(|| format!("failed to run `{} {}`", COCOTB_CONFIG, args.join(" ")))
}

/// Parse a cocotb version. Pre-release suffixes such as `2.0.0.dev0` or
/// `1.9.0rc1` are dropped.
pub fn parse_version(text: &str) -> Result<Version> {
    let text = text.trim().trim_start_matches('v');
    if let Ok(version) = Version::parse(text) {
        return Ok(version);
    }

    let numbers: Vec<u64> = text
        .split('.')
        .take(3)
        .map_while(|part| {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        })
        .collect();

    match numbers.as_slice() {
        [major, minor, patch] => Ok(Version::new(*major, *minor, *patch)),
        _ => bail!("expected MAJOR.MINOR.PATCH cocotb version, got `{}`", text),
    }
}

/// GPI libraries for one run, with entry points appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpiLibraries {
    pub primary: String,
    /// Exported as `GPI_EXTRA`
    pub extra: Option<String>,
}

impl GpiLibraries {
    /// Look up the libraries a hook needs.
    pub fn resolve(hook: &CocotbHook) -> Result<Self> {
        let path = |interface: GpiInterface| {
            cocotb_config(&["--lib-name-path", interface.as_str(), hook.simulator.as_str()])
        };

        let mut primary = path(hook.interface)?;
        if let Some(entry) = &hook.entry_point {
            primary = format!("{}:{}", primary, entry);
        }

        let extra = match hook.extra_interface {
            Some(interface) => Some(format!(
                "{}:{}",
                path(interface)?,
                interface.extra_entry_point()
            )),
            None => None,
        };

        Ok(GpiLibraries { primary, extra })
    }
}

/// Environment of a cocotb run.
///
/// The invocation directory comes first on `PYTHONPATH`, followed by the
/// hook's entries (relative ones resolved against it) and any inherited value.
pub fn hook_environment(
    hook: &CocotbHook,
    runtime: &CocotbRuntime,
    libraries: &GpiLibraries,
    cwd: &Path,
    inherited_pythonpath: Option<&str>,
) -> Vec<(String, String)> {
    let mut pythonpath = vec![cwd.display().to_string()];
    pythonpath.extend(hook.pythonpath.iter().map(|p| cwd.join(p).display().to_string()));
    if let Some(inherited) = inherited_pythonpath.filter(|p| !p.is_empty()) {
        pythonpath.push(inherited.to_string());
    }

    let mut env = vec![
        ("PYTHONPATH".to_string(), pythonpath.join(":")),
        ("LIBPYTHON_LOC".to_string(), runtime.libpython.clone()),
        ("TOPLEVEL".to_string(), hook.toplevel.clone()),
        (
            "COCOTB_RESULTS_FILE".to_string(),
            COCOTB_RESULTS_FILE.to_string(),
        ),
    ];

    match &runtime.python_bin {
        Some(python_bin) => {
            env.push(("PYGPI_PYTHON_BIN".to_string(), python_bin.clone()));
            env.push(("COCOTB_TEST_MODULES".to_string(), hook.module.clone()));
        }
        None => env.push(("MODULE".to_string(), hook.module.clone())),
    }

    if let Some(extra) = &libraries.extra {
        env.push(("GPI_EXTRA".to_string(), extra.clone()));
    }
    if let GpiBinding::EnvVar { name } = &hook.binding {
        env.push((name.clone(), libraries.primary.clone()));
    }

    env
}

/// Wire a hook into the process that runs its step.
pub fn apply_hook(
    mut builder: ProcessBuilder,
    hook: &CocotbHook,
    runtime: &CocotbRuntime,
    cwd: &Path,
) -> Result<ProcessBuilder> {
    let libraries = GpiLibraries::resolve(hook)?;
    let inherited = std::env::var("PYTHONPATH").ok();

    for (key, value) in hook_environment(hook, runtime, &libraries, cwd, inherited.as_deref()) {
        builder = builder.env(key, value);
    }
    if let GpiBinding::Argument { flag } = &hook.binding {
        builder = builder.arg(flag).arg(&libraries.primary);
    }
    Ok(builder)
}

/// Whether a cocotb JUnit report records no failures.
pub fn results_passed(path: &Path) -> Result<bool> {
    let report = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cocotb results: {}", path.display()))?;
    Ok(!report.contains("<failure") && !report.contains("<error"))
}
