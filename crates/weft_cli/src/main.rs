//! weft CLI — the command-line interface for the structured-ASIC flow.
//!
//! Provides `weft visualize` for the plot-data pipeline, `weft eco-generator`
//! for the CTS + power-down + Verilog flow, and `weft make-def` for full DEF
//! emission.

#![warn(missing_docs)]

mod eco_generator;
mod flow;
mod make_def;
#[cfg(test)]
mod testutil;
mod visualize;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// weft — a structured-ASIC physical design back end.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "weft structured-ASIC flow")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (note-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `weft.toml` configuration file or project directory.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the visualization data products for a design.
    Visualize(VisualizeArgs),
    /// Run CTS + power-down ECO and emit the final Verilog netlist.
    #[command(name = "eco-generator", alias = "eco_generator")]
    EcoGenerator(EcoGeneratorArgs),
    /// Emit a routable DEF 5.8 file (optionally running CTS and ECO first).
    #[command(name = "make-def", alias = "make_def")]
    MakeDef(MakeDefArgs),
}

/// Arguments for `weft visualize`.
#[derive(Parser, Debug)]
pub struct VisualizeArgs {
    /// Design name (expects `designs/<name>_mapped.json`).
    #[arg(long)]
    pub design: String,

    /// Run only the named stages.
    #[arg(long, num_args = 1..)]
    pub only: Vec<String>,

    /// Skip the named stages.
    #[arg(long, num_args = 1..)]
    pub skip: Vec<String>,

    /// Placement map to visualize (default: the freshest map in the build
    /// directory, else a fresh greedy placement).
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// Treat missing optional inputs as failures.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `weft eco-generator`.
#[derive(Parser, Debug)]
pub struct EcoGeneratorArgs {
    /// Design name (expects `designs/<name>_mapped.json`).
    #[arg(long)]
    pub design: String,

    /// Placement map to start from.
    #[arg(long)]
    pub placement: Option<PathBuf>,

    /// Output directory (default `build/<design>/`).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `weft make-def`.
#[derive(Parser, Debug)]
pub struct MakeDefArgs {
    /// Design name (expects `designs/<name>_mapped.json`).
    pub design: String,

    /// Additional input files; a `.map` file overrides the placement.
    pub files: Vec<PathBuf>,

    /// Skip clock-tree synthesis.
    #[arg(long)]
    pub no_cts: bool,

    /// Skip the power-down ECO.
    #[arg(long)]
    pub no_eco: bool,

    /// Clock port name (default: auto-detect /clk/i).
    #[arg(long)]
    pub clock: Option<String>,

    /// Output directory (default `build/<design>/`).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Technology LEF path (overrides the configured one).
    #[arg(long)]
    pub tlef: Option<PathBuf>,

    /// Cell-library LEF path (overrides the configured list).
    #[arg(long)]
    pub lef: Option<PathBuf>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print note-level information.
    pub verbose: bool,
    /// Optional path to a custom config file or directory.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Visualize(ref args) => visualize::run(args, &global),
        Command::EcoGenerator(ref args) => eco_generator::run(args, &global),
        Command::MakeDef(ref args) => make_def::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
