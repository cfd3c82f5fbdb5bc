//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// hdlflow - One command line for nvc, Riviera-PRO and Vivado flows
#[derive(Parser)]
#[command(name = "hdlflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// EDA tool to run: nvc, riviera or vivado
    pub eda_tool: String,

    /// Top design unit to simulate or synthesize
    pub top: String,

    /// File listing every source in compile order, one per line
    pub path_to_compile_order: PathBuf,

    /// Open the simulator GUI
    #[arg(long)]
    pub gui: bool,

    /// Waveform viewer to launch after the simulation: gtkwave or surfer
    #[arg(long, value_name = "WAVEFORM_VIEWER")]
    pub wave: Option<String>,

    /// Saved waveform view to open (gtkwave save file, surfer state or Vivado wcfg)
    #[arg(long, value_name = "FILE")]
    pub waveform_view_file: Option<PathBuf>,

    /// Top-level generic or parameter, as GENERIC=VALUE (repeatable)
    #[arg(short, long = "generic", value_name = "GENERIC=VALUE")]
    pub generics: Vec<String>,

    /// Stop the simulation after VALUE UNIT (fs, ps, ns, us, ms or sec)
    #[arg(long, num_args = 2, value_names = ["VALUE", "UNIT"])]
    pub stop_time: Option<Vec<String>>,

    /// Simulator plusarg as NAME or NAME=VALUE, leading `+` optional (repeatable)
    #[arg(long = "plusarg", value_name = "PLUSARG")]
    pub plusargs: Vec<String>,

    /// Level of verbosity
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbose: u8,

    /// cocotb test module to run during simulation
    #[arg(long, value_name = "COCOTB_MODULE")]
    pub cocotb: Option<String>,

    /// Path to add to PYTHONPATH for cocotb (repeatable)
    #[arg(long = "pythonpath", value_name = "PATH")]
    pub pythonpaths: Vec<PathBuf>,

    /// libstdc++ to preload for Riviera-PRO
    #[arg(long, value_name = "PATH")]
    pub libstdcpp: Option<PathBuf>,

    /// Xilinx glbl.v to compile for Riviera-PRO
    #[arg(long, value_name = "PATH")]
    pub glbl: Option<PathBuf>,

    /// Work library name
    #[arg(long, value_name = "LIBRARY")]
    pub work: Option<String>,

    /// FPGA part number for Vivado
    #[arg(long, value_name = "PART_NUMBER")]
    pub part: Option<String>,

    /// FPGA board part for Vivado
    #[arg(long, value_name = "BOARD")]
    pub board: Option<String>,

    /// Run synthesis
    #[arg(long)]
    pub synth: bool,

    /// Run synthesis and implementation
    #[arg(long = "impl")]
    pub implement: bool,

    /// Run synthesis and implementation, then write a bitstream
    #[arg(long)]
    pub bitstream: bool,

    /// Synthesize out of context
    #[arg(long)]
    pub ooc: bool,

    /// Clock period constraint as PORT=PERIOD_NS (repeatable)
    #[arg(long = "clk-period-constraint", value_name = "PORT=PERIOD_NS")]
    pub clk_period_constraints: Vec<String>,

    /// Print the plan as JSON and exit without running any tool
    #[arg(long)]
    pub plan: bool,

    /// Parallel jobs for Vivado synthesis and implementation runs
    #[arg(short, long)]
    pub jobs: Option<u32>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}
