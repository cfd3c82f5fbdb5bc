//! Riviera-PRO do-files.

use std::path::Path;

use super::{generic_words, ScriptText};
use crate::core::language::HdlLanguage;
use crate::core::request::{Generic, StopTime};

/// Compile command for one source, chosen by language.
///
/// Files without a recognized extension are compiled as VHDL.
pub fn compile_command(library: &str, source: &Path) -> String {
    let lang = HdlLanguage::from_path(source).unwrap_or(HdlLanguage::Vhdl);
    let (tool, standard) = match lang {
        HdlLanguage::Vhdl => ("acom", "-2008"),
        HdlLanguage::Verilog => ("alog", "-v2k5"),
        HdlLanguage::SystemVerilog => ("alog", "-sv2k17"),
    };
    format!(
        "{} -work {} {} -incr {}",
        tool,
        library,
        standard,
        source.display()
    )
}

/// `compile.do`: create the work library and compile every source in order.
pub fn render_compile(library: &str, sources: &[impl AsRef<Path>]) -> String {
    let mut script = ScriptText::new();
    script.line(format!("alib {}", library));
    for source in sources {
        script.line(compile_command(library, source.as_ref()));
    }
    script.line("exit");
    script.finish()
}

/// Options of the `asim` command that loads the design.
#[derive(Debug, Clone)]
pub struct AsimOptions<'a> {
    pub library: &'a str,
    pub top: &'a str,
    pub generics: &'a [Generic],
    /// Full signal access, needed by cocotb and by waveform dumps
    pub access: bool,
    /// Option loading the cocotb GPI library, e.g. `-loadvhpi $env(...)`
    pub gpi_load: Option<String>,
    /// Route simulator output through the console when a GUI hosts cocotb
    pub intercept_output: bool,
    /// Also load `glbl` as a second top
    pub glbl: bool,
    /// Plusargs, without the leading `+`
    pub plusargs: &'a [String],
}

impl<'a> AsimOptions<'a> {
    pub fn new(library: &'a str, top: &'a str, generics: &'a [Generic]) -> Self {
        AsimOptions {
            library,
            top,
            generics,
            access: false,
            gpi_load: None,
            intercept_output: false,
            glbl: false,
            plusargs: &[],
        }
    }

    pub fn command(&self) -> String {
        let mut words = vec!["asim".to_string()];
        if self.access {
            words.push("+access +w_nets".to_string());
        }
        if let Some(load) = &self.gpi_load {
            words.push(load.clone());
        }
        if self.intercept_output {
            words.push("-interceptcoutput".to_string());
        }
        words.extend(generic_words("-g", self.generics));
        words.extend(self.plusargs.iter().map(|p| format!("+{}", p)));
        words.push("-ieee_nowarn".to_string());
        words.push(format!("{}.{}", self.library, self.top));
        if self.glbl {
            words.push(format!("{}.glbl", self.library));
        }
        words.join(" ")
    }
}

/// `elaborate.do`: load the design once so elaboration errors surface before
/// the run, then leave.
pub fn render_elaborate(asim: &AsimOptions<'_>) -> String {
    let mut script = ScriptText::new();
    script.line(asim.command());
    script.line("endsim");
    script.line("exit");
    script.finish()
}

/// Settings of the simulation run.
#[derive(Debug, Clone)]
pub struct RunOptions<'a> {
    pub stop_time: Option<StopTime>,
    /// Keep the GUI session open after the run
    pub gui: bool,
    /// VCD dump for an external viewer
    pub vcd_file: Option<String>,
    /// Riviera waveform layout shown in GUI sessions
    pub awc_file: String,
    /// `glbl.v` compiled into the work library before loading
    pub glbl_path: Option<&'a Path>,
}

/// `simulate.do`: load, record, run and (in batch mode) end the simulation.
pub fn render_simulate(asim: &AsimOptions<'_>, run: &RunOptions<'_>) -> String {
    let mut script = ScriptText::new();
    script.line_if(run.gui, "framework.documents.closeall");

    if let Some(glbl) = run.glbl_path {
        script.line(format!(
            "alog -work {} -v2k5 -incr {}",
            asim.library,
            glbl.display()
        ));
    }

    script.line(asim.command());
    script.line("log -rec *");

    if let Some(vcd) = &run.vcd_file {
        script.line(format!("vcd file {}", vcd));
        script.line("vcd add -r *");
    }

    if run.gui {
        script.line(format!("set waveformfile \"{}\"", run.awc_file));
        script.line("if {[file exists $waveformfile]} {");
        script.line("    system.open -wave $waveformfile");
        script.line("} else {");
        script.line("    add wave *");
        script.line("    write awc $waveformfile");
        script.line("}");
    }

    match run.stop_time {
        Some(stop) => script.line(format!("run {} {}", stop.value, stop.unit)),
        None => script.line("run -all"),
    };

    if !run.gui {
        script.line("endsim");
        script.line("exit");
    }
    script.finish()
}
