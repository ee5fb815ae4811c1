//! Reader for splits written by [`crate::split_writer`].

use gridbench_core::{AttributeArray, BenchError, BenchResult, SampleSet};
use polars::io::ipc::IpcReader;
use polars::prelude::{DataFrame, SerReader};
use std::fs::File;
use std::path::Path;

use crate::manifest::{SplitManifest, MANIFEST_FILE};
use crate::split_writer::{split_dir, SAMPLE_COLUMN};

/// Read and validate the manifest of split `split`.
pub fn read_manifest(dataset_dir: &Path, split: &str) -> BenchResult<SplitManifest> {
    let dir = split_dir(dataset_dir, split);
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(BenchError::corrupt(
            split,
            format!(
                "{} not found in {}; the split may be incomplete",
                MANIFEST_FILE,
                dir.display()
            ),
        ));
    }
    let file = File::open(&manifest_path)?;
    let manifest: SplitManifest = serde_json::from_reader(file)
        .map_err(|e| BenchError::corrupt(split, format!("parsing {MANIFEST_FILE}: {e}")))?;
    manifest.is_compatible()?;
    manifest.verify_counts()?;
    manifest.validate_checksums(&dir)?;
    Ok(manifest)
}

/// Load split `split`, requiring every name in `attribute_names`.
///
/// Fails with [`BenchError::CorruptData`] when an attribute file is missing, a
/// checksum does not match, or attribute sample counts disagree.
pub fn read_split(
    dataset_dir: &Path,
    split: &str,
    attribute_names: &[String],
) -> BenchResult<SampleSet> {
    let manifest = read_manifest(dataset_dir, split)?;
    let dir = split_dir(dataset_dir, split);
    let mut samples = SampleSet::new(attribute_names);
    for name in attribute_names {
        let info = manifest
            .attribute(name)
            .ok_or_else(|| BenchError::corrupt(split, format!("attribute '{name}' missing")))?;
        let file = File::open(dir.join(&info.file)).map_err(|e| {
            BenchError::corrupt(split, format!("opening attribute '{name}': {e}"))
        })?;
        let df = IpcReader::new(file)
            .finish()
            .map_err(|e| BenchError::corrupt(split, format!("reading attribute '{name}': {e}")))?;
        let array = from_frame(&df, info.row_count as usize, info.width as usize)
            .map_err(|reason| BenchError::corrupt(split, format!("attribute '{name}': {reason}")))?;
        samples.insert(name.clone(), array);
    }
    samples.check_consistent(split)?;
    Ok(samples)
}

fn from_frame(df: &DataFrame, rows: usize, cols: usize) -> Result<AttributeArray, String> {
    if df.width() != cols + 1 {
        return Err(format!(
            "expected {} element columns, found {}",
            cols,
            df.width().saturating_sub(1)
        ));
    }
    if df.height() != rows {
        return Err(format!("expected {} rows, found {}", rows, df.height()));
    }
    let columns = df.get_columns();
    if columns[0].name() != SAMPLE_COLUMN {
        return Err(format!(
            "first column is '{}', expected '{}'",
            columns[0].name(),
            SAMPLE_COLUMN
        ));
    }
    let mut data = vec![0.0; rows * cols];
    for (col, series) in columns[1..].iter().enumerate() {
        let values = series.f64().map_err(|e| e.to_string())?;
        for (row, value) in values.into_iter().enumerate() {
            let value = value.ok_or_else(|| format!("null value at row {row}, column {col}"))?;
            data[row * cols + col] = value;
        }
    }
    AttributeArray::from_flat(rows, cols, data).map_err(|e| e.to_string())
}
