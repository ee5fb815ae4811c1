use anyhow::{bail, Context, Result};
use gridbench_batch::{load_benchmark_config, BenchmarkConfig, PowerGridBenchmark, DEFAULT_BENCHMARK};
use gridbench_cli::cli::Cli;
use gridbench_scenarios::load_scenario_config;
use tracing::info;

/// Resolve the benchmark configuration named on the command line, applying the
/// `--scenario` file when one is given.
pub fn load_config(cli: &Cli) -> Result<BenchmarkConfig> {
    let mut config = match &cli.config {
        Some(path) => load_benchmark_config(path, &cli.benchmark)
            .with_context(|| format!("loading benchmark config '{}'", path.display()))?,
        None if cli.benchmark == DEFAULT_BENCHMARK => BenchmarkConfig::default(),
        None => bail!(
            "benchmark '{}' is not built in; pass --config with a [benchmarks.{}] table",
            cli.benchmark,
            cli.benchmark
        ),
    };
    if let Some(path) = &cli.scenario {
        config.scenario = load_scenario_config(path)?;
        info!(
            scenario = %path.display(),
            env_name = %config.scenario.env_name,
            "using scenario file"
        );
    }
    Ok(config)
}

/// Build the benchmark under `--root` with the synthetic scenario provider.
pub fn open_benchmark(cli: &Cli) -> Result<PowerGridBenchmark> {
    let config = load_config(cli)?;
    let provider = Box::new(config.provider());
    PowerGridBenchmark::new(config, provider, &cli.root).context("creating benchmark")
}

/// Open and load a persisted benchmark.
pub fn load_benchmark(cli: &Cli) -> Result<PowerGridBenchmark> {
    let mut benchmark = open_benchmark(cli)?;
    benchmark
        .load()
        .with_context(|| format!("loading benchmark '{}'", benchmark.name()))?;
    Ok(benchmark)
}
