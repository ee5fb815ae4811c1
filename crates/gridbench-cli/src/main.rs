use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gridbench_cli::cli::{Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::evaluate::EvaluateArgs;

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Generate {
            train,
            val,
            test,
            test_ood_topo,
        } => commands::generate::handle(cli, [*train, *val, *test, *test_ood_topo]),
        Commands::Inspect { format } => commands::inspect::handle(cli, *format),
        Commands::Evaluate {
            dataset,
            surrogate,
            batch_size,
            save_path,
            no_active_flow,
        } => commands::evaluate::handle(
            cli,
            EvaluateArgs {
                dataset,
                surrogate: *surrogate,
                batch_size: *batch_size,
                save_path: save_path.as_deref(),
                active_flow: !*no_active_flow,
            },
        ),
        Commands::CheckConservation { split, tolerance } => {
            commands::conservation::handle(cli, split, *tolerance)
        }
        Commands::Completions { shell, out } => commands::completions::handle(*shell, out.as_deref()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
    {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    info!(benchmark = %cli.benchmark, root = %cli.root.display(), "gridbench starting");
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
