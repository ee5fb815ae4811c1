//! Energy conservation check over persisted observations.

use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use gridbench_algo::ConservationLawChecker;
use gridbench_cli::cli::Cli;
use gridbench_core::SplitName;
use tabwriter::TabWriter;

use super::common::load_benchmark;

fn selected_splits(selector: &str) -> Result<Vec<SplitName>> {
    if selector == "all" {
        return Ok(SplitName::ALL.to_vec());
    }
    SplitName::ALL
        .iter()
        .find(|split| split.as_str() == selector)
        .map(|split| vec![*split])
        .ok_or_else(|| anyhow!("unknown split '{selector}'"))
}

pub fn handle(cli: &Cli, selector: &str, tolerance: f64) -> Result<()> {
    let splits = selected_splits(selector)?;
    let benchmark = load_benchmark(cli)?;
    let checker = ConservationLawChecker::new(tolerance);

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SPLIT\tOBSERVATIONS\tFAILED\tVIOLATION %\tMAX |DEVIATION|")?;
    for split in splits {
        let Some(dataset) = benchmark.split(split) else {
            bail!("split '{split}' is not part of the benchmark");
        };
        if dataset.is_empty() {
            writeln!(writer, "{split}\t0\t-\t-\t-")?;
            continue;
        }
        let data = dataset.data();
        let attribute = |name: &str| {
            data.get(name)
                .with_context(|| format!("split '{split}' has no '{name}' attribute"))
        };
        let report = checker.check(
            attribute("prod_p")?,
            attribute("load_p")?,
            attribute("p_or")?,
            attribute("p_ex")?,
        )?;
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.2}\t{:.3e}",
            split,
            report.n_observations(),
            report.failed_indices.len(),
            report.violation_percentage,
            report.max_abs_deviation()
        )?;
    }
    writer.flush()?;
    Ok(())
}
