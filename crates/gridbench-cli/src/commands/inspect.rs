//! Summary of a persisted benchmark.

use std::io::{self, Write};

use anyhow::Result;
use gridbench_cli::cli::{Cli, OutputFormat};
use gridbench_core::SplitName;
use serde::Serialize;
use tabwriter::TabWriter;

use super::common::load_benchmark;

#[derive(Serialize)]
struct SplitSummary {
    split: SplitName,
    samples: usize,
    attributes: usize,
    elements: usize,
}

pub fn handle(cli: &Cli, format: OutputFormat) -> Result<()> {
    let benchmark = load_benchmark(cli)?;
    let summaries: Vec<SplitSummary> = SplitName::ALL
        .iter()
        .filter_map(|name| benchmark.split(*name))
        .map(|split| SplitSummary {
            split: split.name(),
            samples: split.len(),
            attributes: split.attribute_names().len(),
            elements: split.data().iter().map(|(_, array)| array.cols()).sum(),
        })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            println!(
                "Benchmark '{}' at {}",
                benchmark.name(),
                benchmark.dataset_path().display()
            );
            let mut writer = TabWriter::new(io::stdout());
            writeln!(writer, "SPLIT\tSAMPLES\tATTRIBUTES\tELEMENTS")?;
            for summary in &summaries {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}",
                    summary.split, summary.samples, summary.attributes, summary.elements
                )?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}
