//! Configuration file support for hdlflow.
//!
//! hdlflow reads two configuration files:
//! - Global: `~/.hdlflow/config.toml` - User-wide defaults
//! - Project: `.hdlflow/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! options take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::request::{RequestSpec, Tool};

/// hdlflow configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for every tool
    pub build: BuildConfig,

    /// Settings only applied to Vivado runs
    pub vivado: VivadoConfig,
}

/// Tool-independent settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Work library name
    pub work: Option<String>,

    /// Extra PYTHONPATH entries for cocotb, appended after command-line ones
    pub pythonpath: Vec<PathBuf>,
}

/// Vivado settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VivadoConfig {
    /// FPGA part number
    pub part: Option<String>,

    /// FPGA board part
    pub board: Option<String>,

    /// Parallel jobs for synthesis and implementation runs
    pub jobs: Option<u32>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.work.is_some() {
            self.build.work = other.build.work;
        }
        if !other.build.pythonpath.is_empty() {
            self.build.pythonpath = other.build.pythonpath;
        }

        if other.vivado.part.is_some() || other.vivado.board.is_some() {
            self.vivado.part = other.vivado.part;
            self.vivado.board = other.vivado.board;
        }
        if other.vivado.jobs.is_some() {
            self.vivado.jobs = other.vivado.jobs;
        }
    }

    /// Fill request settings the command line left unset.
    ///
    /// `[vivado]` keys only apply when the request targets Vivado, so a shared
    /// config never trips the part/board compatibility rule for simulators.
    pub fn apply_to(&self, spec: &mut RequestSpec) {
        if spec.default_library.is_none() {
            spec.default_library = self.build.work.clone();
        }
        spec.pythonpath_entries
            .extend(self.build.pythonpath.iter().cloned());

        if spec.tool != Tool::Vivado {
            return;
        }
        if spec.part.is_none() && spec.board.is_none() {
            spec.part = self.vivado.part.clone();
            spec.board = self.vivado.board.clone();
        }
        if spec.jobs.is_none() {
            spec.jobs = self.vivado.jobs;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.hdlflow/config.toml)
/// 2. Global config (~/.hdlflow/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }
    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global hdlflow config directory (~/.hdlflow).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".hdlflow"))
}

/// Get the global config path (~/.hdlflow/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.hdlflow/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".hdlflow").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[build]
work = "lib_a"
pythonpath = ["tests", "/opt/models"]

[vivado]
part = "xc7k325tffg900-2"
jobs = 12
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.build.work.as_deref(), Some("lib_a"));
        assert_eq!(
            config.build.pythonpath,
            vec![PathBuf::from("tests"), PathBuf::from("/opt/models")]
        );
        assert_eq!(config.vivado.part.as_deref(), Some("xc7k325tffg900-2"));
        assert_eq!(config.vivado.jobs, Some(12));
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[build\nwork = ").unwrap();

        assert!(Config::load(&config_path).is_err());
        assert_eq!(Config::load_or_default(&config_path), Config::default());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[build]
work = "global_lib"

[vivado]
part = "xc7a100tcsg324-1"
jobs = 2
"#,
        )
        .unwrap();

        // Project picks a board, which replaces the global part
        std::fs::write(
            &project_path,
            r#"
[vivado]
board = "digilentinc.com:arty-a7-100:part0:1.1"
"#,
        )
        .unwrap();

        let config = load_config(Some(&global_path), &project_path);
        assert_eq!(config.build.work.as_deref(), Some("global_lib"));
        assert_eq!(config.vivado.part, None);
        assert_eq!(
            config.vivado.board.as_deref(),
            Some("digilentinc.com:arty-a7-100:part0:1.1")
        );
        assert_eq!(config.vivado.jobs, Some(2));
    }

    #[test]
    fn test_missing_files_give_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, &tmp.path().join("nope.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_apply_keeps_command_line_values() {
        let mut config = Config::default();
        config.build.work = Some("cfg_lib".to_string());
        config.build.pythonpath = vec![PathBuf::from("/cfg")];
        config.vivado.part = Some("xc7a35ticsg324-1L".to_string());
        config.vivado.jobs = Some(8);

        let mut spec = RequestSpec::new(Tool::Vivado, "top", vec![PathBuf::from("/top.vhd")])
            .with_library("cli_lib")
            .with_pythonpath("/cli")
            .with_board("digilentinc.com:basys3:part0:1.2");
        config.apply_to(&mut spec);

        assert_eq!(spec.library(), "cli_lib");
        assert_eq!(
            spec.pythonpath_entries,
            vec![PathBuf::from("/cli"), PathBuf::from("/cfg")]
        );
        // A board on the command line keeps the configured part out
        assert_eq!(spec.part, None);
        assert_eq!(spec.jobs(), 8);
    }

    #[test]
    fn test_vivado_keys_skip_simulators() {
        let mut config = Config::default();
        config.build.work = Some("cfg_lib".to_string());
        config.vivado.part = Some("xc7a35ticsg324-1L".to_string());
        config.vivado.jobs = Some(8);

        let mut spec = RequestSpec::new(Tool::Nvc, "top", vec![PathBuf::from("/top.vhd")]);
        config.apply_to(&mut spec);

        assert_eq!(spec.library(), "cfg_lib");
        assert_eq!(spec.part, None);
        assert_eq!(spec.jobs, None);
    }
}
