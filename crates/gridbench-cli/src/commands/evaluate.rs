use std::path::Path;

use anyhow::{Context, Result};
use gridbench_batch::{AugmentedSimulator, MeanBaseline, ObservationReplay};
use gridbench_cli::cli::{Cli, SurrogateKind};
use gridbench_core::SplitName;

use super::common::load_benchmark;

pub struct EvaluateArgs<'a> {
    pub dataset: &'a str,
    pub surrogate: SurrogateKind,
    pub batch_size: usize,
    pub save_path: Option<&'a Path>,
    pub active_flow: bool,
}

pub fn handle(cli: &Cli, args: EvaluateArgs<'_>) -> Result<()> {
    let mut benchmark = load_benchmark(cli)?;
    let mut surrogate: Box<dyn AugmentedSimulator> = match args.surrogate {
        SurrogateKind::Mean => {
            let train = benchmark
                .split(SplitName::Train)
                .context("benchmark has no training split")?;
            Box::new(MeanBaseline::fit(train).context("fitting mean baseline")?)
        }
        SurrogateKind::Replay => Box::new(ObservationReplay),
    };
    let results = benchmark
        .evaluate_simulator(
            args.dataset,
            surrogate.as_mut(),
            args.batch_size,
            args.save_path,
            args.active_flow,
        )
        .with_context(|| format!("evaluating '{}' on '{}'", surrogate.name(), args.dataset))?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
