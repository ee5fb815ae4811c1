use anyhow::{Context, Result};
use gridbench_cli::cli::Cli;
use gridbench_core::SplitName;
use tracing::info;

use super::common::open_benchmark;

pub fn handle(cli: &Cli, counts: [usize; 4]) -> Result<()> {
    let mut benchmark = open_benchmark(cli)?;
    let [train, val, test, test_ood_topo] = counts;
    info!(
        benchmark = benchmark.name(),
        train, val, test, test_ood_topo, "generating benchmark"
    );
    benchmark
        .generate(train, val, test, test_ood_topo)
        .with_context(|| format!("generating benchmark '{}'", benchmark.name()))?;
    println!(
        "Generated benchmark '{}' in {}",
        benchmark.name(),
        benchmark.dataset_path().display()
    );
    for split in SplitName::ALL {
        let samples = benchmark.split(split).map(|s| s.len()).unwrap_or(0);
        println!("  {split:<14} {samples} samples");
    }
    Ok(())
}
