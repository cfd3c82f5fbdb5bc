//! Vivado project-mode Tcl scripts.
//!
//! The analyze step creates a project under the output directory; every later
//! script opens it, does one thing and closes it again, so each step can run
//! in its own `vivado -mode batch` process.

use std::path::Path;

use super::{generic_words, ScriptText};
use crate::core::language::HdlLanguage;
use crate::core::request::{Generic, StopTime};

/// Name of the XDC file carrying clock constraints.
pub const CLOCK_CONSTRAINTS_FILE: &str = "clocks.xdc";

/// Project location settings shared by every script.
#[derive(Debug, Clone)]
pub struct Project<'a> {
    pub name: &'a str,
}

impl Project<'_> {
    /// Path of the `.xpr` file, relative to the output directory.
    pub fn xpr(&self) -> String {
        format!("./{}/{}.xpr", self.name, self.name)
    }

    fn open(&self, script: &mut ScriptText) {
        script.line(format!("open_project {}", self.xpr()));
    }
}

/// Device selection for `create_project`.
#[derive(Debug, Clone)]
pub struct Device<'a> {
    /// Part number; `None` when only a board was given
    pub part: Option<&'a str>,
    pub board: Option<&'a str>,
}

/// `project.tcl`: create the project, select the device and add the sources
/// in compile order.
pub fn render_project(
    project: &Project<'_>,
    device: &Device<'_>,
    library: &str,
    sources: &[impl AsRef<Path>],
) -> String {
    let mut script = ScriptText::new();

    match device.part {
        Some(part) => script.line(format!(
            "create_project -force -part {} {} ./{}",
            part, project.name, project.name
        )),
        None => script.line(format!(
            "create_project -force {} ./{}",
            project.name, project.name
        )),
    };
    if let Some(board) = device.board {
        script.line(format!("set_property board_part {} [current_project]", board));
    }

    // Files compile in the order they are added
    script.line("set_property source_mgmt_mode None [current_project]");

    for source in sources {
        script.line(format!("add_files -norecurse {}", source.as_ref().display()));
    }

    script.line(format!(
        "set_property library {} [get_files -of_objects [get_filesets sources_1]]",
        library
    ));

    let has_vhdl = sources
        .iter()
        .any(|s| HdlLanguage::from_path(s.as_ref()) == Some(HdlLanguage::Vhdl));
    if has_vhdl {
        script.line("set_property file_type {VHDL 2008} [get_files -quiet *.vhd]");
        script.line("set_property file_type {VHDL 2008} [get_files -quiet *.vhdl]");
    }

    script.line("close_project");
    script.finish()
}

/// What the elaborate script runs after setting top and generics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElaborationTarget {
    /// RTL elaboration for a synthesis flow
    Synthesis { ooc: bool },
    /// xsim elaboration for a simulation flow
    Simulation,
}

/// `elaborate.tcl`: bind the top and its generics, then elaborate.
pub fn render_elaborate(
    project: &Project<'_>,
    top: &str,
    library: &str,
    generics: &[Generic],
    target: ElaborationTarget,
) -> String {
    let mut script = ScriptText::new();
    project.open(&mut script);

    script.line(format!("set_property top {} [get_filesets sources_1]", top));
    script.line(format!("set_property top {} [get_filesets sim_1]", top));
    script.line(format!("set_property top_lib {} [get_filesets sim_1]", library));

    if !generics.is_empty() {
        let assignments: Vec<String> = generic_words("", generics).collect();
        script.line(format!(
            "set_property generic {{{}}} [get_filesets sources_1]",
            assignments.join(" ")
        ));
        let xelab: Vec<String> = generic_words("-generic_top ", generics).collect();
        script.line(format!(
            "set_property -name {{xsim.elaborate.xelab.more_options}} -value {{{}}} -objects [get_filesets sim_1]",
            xelab.join(" ")
        ));
    }

    match target {
        ElaborationTarget::Synthesis { ooc: true } => {
            script.line("synth_design -rtl -mode out_of_context -name rtl_1")
        }
        ElaborationTarget::Synthesis { ooc: false } => script.line("synth_design -rtl -name rtl_1"),
        ElaborationTarget::Simulation => script.line("launch_simulation -step elaborate"),
    };

    script.line("close_project");
    script.finish()
}

/// `simulate.tcl`: run xsim, optionally leaving the GUI open.
pub fn render_simulate(
    project: &Project<'_>,
    stop_time: Option<StopTime>,
    plusargs: &[String],
    view_file: Option<&Path>,
    gui: bool,
) -> String {
    let mut script = ScriptText::new();
    project.open(&mut script);

    let runtime = match stop_time {
        Some(stop) => format!("{}{}", stop.value, stop.unit.as_suffix()),
        None => "-all".to_string(),
    };
    script.line(format!(
        "set_property -name {{xsim.simulate.runtime}} -value {{{}}} -objects [get_filesets sim_1]",
        runtime
    ));

    if !plusargs.is_empty() {
        let options: Vec<String> = plusargs
            .iter()
            .map(|p| format!("-testplusarg {}", p))
            .collect();
        script.line(format!(
            "set_property -name {{xsim.simulate.xsim.more_options}} -value {{{}}} -objects [get_filesets sim_1]",
            options.join(" ")
        ));
    }

    if let Some(view) = view_file {
        script.line(format!(
            "if {{[llength [get_files -quiet {}]] == 0}} {{ add_files -fileset sim_1 -norecurse {} }}",
            view.display(),
            view.display()
        ));
        script.line(format!(
            "set_property xsim.view {} [get_filesets sim_1]",
            view.display()
        ));
    }

    script.line("launch_simulation");

    if gui {
        script.line("start_gui");
    } else {
        script.line("close_sim");
        script.line("close_project");
    }
    script.finish()
}

/// `synthesize.tcl`: add clock constraints, set the synthesis mode and run
/// `synth_1`.
pub fn render_synthesize(project: &Project<'_>, ooc: bool, constrained: bool, jobs: u32) -> String {
    let mut script = ScriptText::new();
    project.open(&mut script);

    if constrained {
        script.line(format!(
            "if {{[llength [get_files -quiet {}]] == 0}} {{ add_files -fileset constrs_1 -norecurse {} }}",
            CLOCK_CONSTRAINTS_FILE, CLOCK_CONSTRAINTS_FILE
        ));
    }

    let mode = if ooc { "-mode out_of_context" } else { "" };
    script.line(format!(
        "set_property -name {{STEPS.SYNTH_DESIGN.ARGS.MORE OPTIONS}} -value {{{}}} -objects [get_runs synth_1]",
        mode
    ));

    launch_and_wait(&mut script, "synth_1", None, jobs);
    script.line("close_project");
    script.finish()
}

/// `implement.tcl`: place and route.
pub fn render_implement(project: &Project<'_>, jobs: u32) -> String {
    let mut script = ScriptText::new();
    project.open(&mut script);
    launch_and_wait(&mut script, "impl_1", None, jobs);
    script.line("close_project");
    script.finish()
}

/// `bitstream.tcl`: continue `impl_1` through `write_bitstream`.
pub fn render_bitstream(project: &Project<'_>, jobs: u32) -> String {
    let mut script = ScriptText::new();
    project.open(&mut script);
    launch_and_wait(&mut script, "impl_1", Some("write_bitstream"), jobs);
    script.line("close_project");
    script.finish()
}

fn launch_and_wait(script: &mut ScriptText, run: &str, to_step: Option<&str>, jobs: u32) {
    match to_step {
        Some(step) => script.line(format!(
            "launch_runs {} -to_step {} -jobs {}",
            run, step, jobs
        )),
        None => {
            script.line(format!("reset_run {}", run));
            script.line(format!("launch_runs {} -jobs {}", run, jobs))
        }
    };
    script.line(format!("wait_on_run {}", run));
    script.line(format!(
        "if {{[get_property PROGRESS [get_runs {}]] != \"100%\"}} {{ error \"{} failed\" }}",
        run, run
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::TimeUnit;
    use std::path::PathBuf;

    const PROJECT: Project<'static> = Project { name: "alu" };

    #[test]
    fn test_project_script() {
        let sources = vec![PathBuf::from("/rtl/b.vhd"), PathBuf::from("/rtl/a.sv")];
        let device = Device {
            part: Some("xc7a35ticsg324-1L"),
            board: None,
        };
        let script = render_project(&PROJECT, &device, "work", &sources);

        assert!(script.contains("create_project -force -part xc7a35ticsg324-1L alu ./alu\n"));
        assert!(script.contains("set_property source_mgmt_mode None"));
        assert!(script.find("/rtl/b.vhd").unwrap() < script.find("/rtl/a.sv").unwrap());
        assert!(script.contains("file_type {VHDL 2008}"));
        assert!(!script.contains("board_part"));
    }

    #[test]
    fn test_project_script_with_board_only() {
        let sources = vec![PathBuf::from("/rtl/a.v")];
        let device = Device {
            part: None,
            board: Some("digilentinc.com:arty-a7-35:part0:1.1"),
        };
        let script = render_project(&PROJECT, &device, "work", &sources);
        assert!(script.contains("create_project -force alu ./alu\n"));
        assert!(script
            .contains("set_property board_part digilentinc.com:arty-a7-35:part0:1.1 [current_project]"));
        assert!(!script.contains("VHDL 2008"));
    }

    #[test]
    fn test_elaborate_generics() {
        let generics = vec![Generic::new("WIDTH", "8"), Generic::new("DEPTH", "4")];
        let script = render_elaborate(
            &PROJECT,
            "alu",
            "work",
            &generics,
            ElaborationTarget::Synthesis { ooc: true },
        );
        assert!(script.contains("open_project ./alu/alu.xpr\n"));
        assert!(script.contains("set_property generic {WIDTH=8 DEPTH=4} [get_filesets sources_1]"));
        assert!(script.contains("-value {-generic_top WIDTH=8 -generic_top DEPTH=4}"));
        assert!(script.contains("synth_design -rtl -mode out_of_context -name rtl_1"));
    }

    #[test]
    fn test_elaborate_for_simulation_without_generics() {
        let script = render_elaborate(&PROJECT, "alu", "work", &[], ElaborationTarget::Simulation);
        assert!(!script.contains("generic"));
        assert!(script.contains("launch_simulation -step elaborate"));
    }

    #[test]
    fn test_simulate_runtime_and_view() {
        let script = render_simulate(
            &PROJECT,
            Some(StopTime::new(2, TimeUnit::Sec)),
            &[],
            Some(Path::new("alu.wcfg")),
            false,
        );
        assert!(script.contains("-value {2s}"));
        assert!(script.contains("set_property xsim.view alu.wcfg"));
        assert!(script.contains("close_sim"));
        assert!(!script.contains("more_options"));

        let script = render_simulate(&PROJECT, None, &[], None, true);
        assert!(script.contains("-value {-all}"));
        assert!(script.ends_with("start_gui\n"));
    }

    #[test]
    fn test_simulate_plusargs() {
        let plusargs = vec!["rand_clk_en".to_string(), "num_outputs=128".to_string()];
        let script = render_simulate(&PROJECT, None, &plusargs, None, false);
        let options = script.find("xsim.simulate.xsim.more_options").unwrap();
        let launch = script.find("launch_simulation").unwrap();
        assert!(options < launch);
        assert!(script
            .contains("-value {-testplusarg rand_clk_en -testplusarg num_outputs=128}"));
    }

    #[test]
    fn test_synthesize_mode_precedes_launch() {
        let script = render_synthesize(&PROJECT, true, true, 8);
        let mode = script.find("-mode out_of_context").unwrap();
        let launch = script.find("launch_runs synth_1 -jobs 8").unwrap();
        let xdc = script.find(CLOCK_CONSTRAINTS_FILE).unwrap();
        assert!(xdc < mode);
        assert!(mode < launch);
        assert!(script.contains("wait_on_run synth_1"));
    }

    #[test]
    fn test_bitstream_continues_implementation() {
        let script = render_bitstream(&PROJECT, 4);
        assert!(script.contains("launch_runs impl_1 -to_step write_bitstream -jobs 4"));
        assert!(!script.contains("reset_run"));

        let script = render_implement(&PROJECT, 4);
        assert!(script.contains("reset_run impl_1"));
        assert!(script.contains("launch_runs impl_1 -jobs 4"));
    }
}
