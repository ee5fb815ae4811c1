use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Benchmark surrogate power-grid simulators", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// Benchmark configuration file (TOML); the built-in benchmark is used when omitted
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Benchmark name under `[benchmarks.<name>]`
    #[arg(long, default_value = "Benchmark1", global = true)]
    pub benchmark: String,

    /// Synthetic grid description (YAML or JSON) replacing the benchmark's `scenario` table
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub scenario: Option<PathBuf>,

    /// Directory holding one dataset directory per benchmark
    #[arg(long, default_value = "benchmarks", global = true, value_hint = ValueHint::DirPath)]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate and persist the four dataset splits
    Generate {
        #[arg(long, default_value_t = 1000)]
        train: usize,
        #[arg(long, default_value_t = 200)]
        val: usize,
        #[arg(long, default_value_t = 200)]
        test: usize,
        #[arg(long, default_value_t = 200)]
        test_ood_topo: usize,
    },
    /// Load a persisted benchmark and list its splits
    Inspect {
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Evaluate a reference surrogate on held-out splits
    Evaluate {
        /// `all`, `val`, `test` or `test_ood_topo` (a `_dataset` suffix is accepted)
        #[arg(long, default_value = "all")]
        dataset: String,
        #[arg(long, value_enum, default_value_t = SurrogateKind::Mean)]
        surrogate: SurrogateKind,
        #[arg(long, default_value_t = 32)]
        batch_size: usize,
        /// Write one JSON report per split into this directory
        #[arg(long, value_hint = ValueHint::DirPath)]
        save_path: Option<PathBuf>,
        /// Skip metrics that need power flows
        #[arg(long)]
        no_active_flow: bool,
    },
    /// Run the energy conservation check on persisted observations
    CheckConservation {
        /// `all` or a split name (train included)
        #[arg(long, default_value = "all")]
        split: String,
        #[arg(long, default_value_t = 1e-3)]
        tolerance: f64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Reference surrogates shipped with the CLI.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurrogateKind {
    /// Per-element target means fitted on the training split
    Mean,
    /// Ground-truth replay
    Replay,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
