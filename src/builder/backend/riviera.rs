//! Riviera-PRO backend.
//!
//! Riviera is driven through do-files: `compile.do`, `elaborate.do` and
//! `simulate.do`, each run by `vsimsa -do` (or `vsim -do` for GUI sessions).

use crate::builder::backend::BackendAdapter;
use crate::builder::plan::{
    CocotbHook, CommandSpec, GeneratedFile, GpiBinding, GpiInterface, Step, StepKind,
};
use crate::builder::script::riviera::{self, AsimOptions, RunOptions};
use crate::builder::validation::Validated;
use crate::core::language::top_language;
use crate::core::request::Tool;

/// Environment variable carrying the cocotb GPI library (`path[:entry]`)
/// into `simulate.do`.
pub const GPI_LIBRARY_VAR: &str = "HDLFLOW_GPI_LIBRARY";

const COMPILE_SCRIPT: &str = "compile.do";
const ELABORATE_SCRIPT: &str = "elaborate.do";
const SIMULATE_SCRIPT: &str = "simulate.do";

#[derive(Debug, Clone, Copy, Default)]
pub struct RivieraBackend;

impl RivieraBackend {
    fn do_command(program: &str, script: &str) -> CommandSpec {
        CommandSpec::new(program).args(["-do", script])
    }

    /// Interface cocotb attaches through, chosen by the top's language.
    fn gpi_interface(spec: &Validated<'_>) -> GpiInterface {
        match top_language(&spec.top, &spec.sources) {
            Some(lang) if lang.is_verilog_family() => GpiInterface::Vpi,
            _ => GpiInterface::Vhpi,
        }
    }
}

impl BackendAdapter for RivieraBackend {
    fn tool(&self) -> Tool {
        Tool::Riviera
    }

    fn has_native_viewer(&self) -> bool {
        false
    }

    fn build_analyze_steps(&self, spec: &Validated<'_>) -> Vec<Step> {
        let script = riviera::render_compile(spec.library(), &spec.sources);
        let step = Step::script(
            StepKind::Analyze,
            format!(
                "compile {} source(s) into {}",
                spec.sources.len(),
                spec.library()
            ),
            Self::do_command("vsimsa", COMPILE_SCRIPT),
            GeneratedFile::new(COMPILE_SCRIPT, script),
        )
        .with_sources(spec.sources.iter().cloned());
        vec![step]
    }

    fn build_elaborate_step(&self, spec: &Validated<'_>) -> Step {
        let asim = AsimOptions::new(spec.library(), &spec.top, &spec.generics);
        Step::script(
            StepKind::Elaborate,
            format!("elaborate {}", spec.top),
            Self::do_command("vsimsa", ELABORATE_SCRIPT),
            GeneratedFile::new(ELABORATE_SCRIPT, riviera::render_elaborate(&asim)),
        )
    }

    fn build_run_step(&self, spec: &Validated<'_>) -> Step {
        let interface = Self::gpi_interface(spec);

        let mut asim = AsimOptions::new(spec.library(), &spec.top, &spec.generics);
        asim.access = spec.cocotb_module.is_some() || spec.wave_viewer.is_some();
        asim.glbl = spec.glbl_path.is_some();
        asim.plusargs = &spec.plusargs;
        if spec.cocotb_module.is_some() {
            let flag = match interface {
                GpiInterface::Vhpi => "-loadvhpi",
                GpiInterface::Vpi => "-pli",
            };
            asim.gpi_load = Some(format!("{} $env({})", flag, GPI_LIBRARY_VAR));
            asim.intercept_output = spec.gui;
        }

        let stem = spec.waveform_stem();
        let run = RunOptions {
            stop_time: spec.stop_time,
            gui: spec.gui,
            vcd_file: self.waveform_dump(spec),
            awc_file: format!("{}.awc", stem),
            glbl_path: spec.glbl_path.as_deref(),
        };
        let script = riviera::render_simulate(&asim, &run);

        let program = if spec.gui { "vsim" } else { "vsimsa" };
        let mut cmd = Self::do_command(program, SIMULATE_SCRIPT);
        if let Some(libstdcpp) = &spec.libstdcpp_path {
            cmd = cmd.env("LD_PRELOAD", libstdcpp.display().to_string());
        }

        let mut hook = None;
        if let Some(module) = &spec.cocotb_module {
            cmd = cmd.env("TOPLEVEL", spec.top.as_str());
            if !spec.gui {
                cmd = cmd.env("COCOTB_ANSI_OUTPUT", "1");
            }
            hook = Some(CocotbHook {
                module: module.clone(),
                toplevel: spec.top.clone(),
                simulator: "riviera".to_string(),
                interface,
                entry_point: match interface {
                    GpiInterface::Vhpi => Some("vhpi_startup_routines_bootstrap".to_string()),
                    GpiInterface::Vpi => None,
                },
                binding: GpiBinding::EnvVar {
                    name: GPI_LIBRARY_VAR.to_string(),
                },
                extra_interface: Some(match interface {
                    GpiInterface::Vhpi => GpiInterface::Vpi,
                    GpiInterface::Vpi => GpiInterface::Vhpi,
                }),
                pythonpath: spec.pythonpath_entries.clone(),
            });
        }

        let step = Step::script(
            StepKind::Run,
            format!("simulate {}", spec.top),
            cmd,
            GeneratedFile::new(SIMULATE_SCRIPT, script),
        );
        match hook {
            Some(hook) => step.with_cocotb(hook),
            None => step,
        }
    }

    fn waveform_dump(&self, spec: &Validated<'_>) -> Option<String> {
        spec.wave_viewer
            .map(|_| format!("{}.vcd", spec.waveform_stem()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::validation::validate;
    use crate::core::request::{RequestSpec, WaveViewer};
    use std::path::PathBuf;

    fn mixed_request() -> RequestSpec {
        RequestSpec::new(
            Tool::Riviera,
            "fifo_tb",
            vec![
                PathBuf::from("/rtl/fifo.vhd"),
                PathBuf::from("/rtl/ram.v"),
                PathBuf::from("/tb/fifo_tb.sv"),
            ],
        )
    }

    #[test]
    fn test_analyze_is_one_batched_script() {
        let spec = mixed_request();
        let spec = validate(&spec).unwrap();
        let steps = RivieraBackend.build_analyze_steps(&spec);
        assert_eq!(steps.len(), 1);

        let step = &steps[0];
        assert_eq!(step.command_spec().display_command(), "vsimsa -do compile.do");
        assert_eq!(step.sources, spec.sources);

        let script = step.script_text().unwrap();
        assert!(script.contains("acom -work work -2008 -incr /rtl/fifo.vhd"));
        assert!(script.contains("alog -work work -v2k5 -incr /rtl/ram.v"));
        assert!(script.contains("alog -work work -sv2k17 -incr /tb/fifo_tb.sv"));
    }

    #[test]
    fn test_run_in_gui() {
        let spec = mixed_request().with_gui(true);
        let spec = validate(&spec).unwrap();
        let step = RivieraBackend.build_run_step(&spec);
        assert_eq!(step.command_spec().program, "vsim");
        assert!(!step.script_text().unwrap().contains("endsim"));
    }

    #[test]
    fn test_run_with_libstdcpp_and_glbl() {
        let spec = mixed_request()
            .with_libstdcpp("/usr/lib/libstdc++.so.6")
            .with_glbl("/xilinx/glbl.v");
        let spec = validate(&spec).unwrap();
        let step = RivieraBackend.build_run_step(&spec);

        assert_eq!(
            step.command_spec().env,
            vec![(
                "LD_PRELOAD".to_string(),
                "/usr/lib/libstdc++.so.6".to_string()
            )]
        );
        let script = step.script_text().unwrap();
        assert!(script.contains("/xilinx/glbl.v"));
        assert!(script.contains("work.fifo_tb work.glbl"));
    }

    #[test]
    fn test_run_passes_plusargs_to_asim() {
        let spec = mixed_request().with_plusarg("num_outputs=128");
        let spec = validate(&spec).unwrap();

        let run = RivieraBackend.build_run_step(&spec);
        assert!(run
            .script_text()
            .unwrap()
            .contains("asim +num_outputs=128 -ieee_nowarn work.fifo_tb"));

        // Elaboration only loads the design
        let elaborate = RivieraBackend.build_elaborate_step(&spec);
        assert!(!elaborate.script_text().unwrap().contains("+num_outputs"));
    }

    #[test]
    fn test_cocotb_on_verilog_top_uses_vpi() {
        let spec = mixed_request().with_cocotb("test_fifo");
        let spec = validate(&spec).unwrap();
        let step = RivieraBackend.build_run_step(&spec);

        let hook = step.cocotb.as_ref().unwrap();
        assert_eq!(hook.interface, GpiInterface::Vpi);
        assert_eq!(hook.extra_interface, Some(GpiInterface::Vhpi));
        assert_eq!(hook.entry_point, None);
        assert!(step
            .script_text()
            .unwrap()
            .contains("-pli $env(HDLFLOW_GPI_LIBRARY)"));
        assert!(step
            .command_spec()
            .env
            .contains(&("TOPLEVEL".to_string(), "fifo_tb".to_string())));
    }

    #[test]
    fn test_cocotb_on_vhdl_top_uses_vhpi() {
        let spec = RequestSpec::new(Tool::Riviera, "fifo_tb", vec![PathBuf::from("/tb/fifo_tb.vhd")])
            .with_cocotb("test_fifo");
        let spec = validate(&spec).unwrap();
        let step = RivieraBackend.build_run_step(&spec);

        let hook = step.cocotb.as_ref().unwrap();
        assert_eq!(hook.interface, GpiInterface::Vhpi);
        assert_eq!(
            hook.entry_point.as_deref(),
            Some("vhpi_startup_routines_bootstrap")
        );
        assert!(step
            .script_text()
            .unwrap()
            .contains("+access +w_nets -loadvhpi $env(HDLFLOW_GPI_LIBRARY)"));
    }

    #[test]
    fn test_external_viewer_dumps_vcd() {
        let spec = mixed_request().with_wave_viewer(WaveViewer::Gtkwave);
        let spec = validate(&spec).unwrap();
        let run = RivieraBackend.build_run_step(&spec);
        assert!(run.script_text().unwrap().contains("vcd file fifo_tb.vcd"));

        let waves = RivieraBackend.build_waveform_step(&spec).unwrap();
        assert_eq!(
            waves.command_spec().display_command(),
            "gtkwave fifo_tb.vcd -a fifo_tb.gtkw"
        );
    }
}
