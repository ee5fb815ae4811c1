//! Arrow IPC writer for one dataset split.
//!
//! Layout under the dataset directory:
//!
//! ```text
//! <dataset_dir>/
//!   <split>/
//!     <attribute>.arrow     # sample index + one column per element, one row per sample
//!     manifest.json         # written last; signals a complete split
//! ```

use gridbench_core::{AttributeArray, BenchError, BenchResult, SampleSet};
use polars::io::ipc::IpcWriter;
use polars::prelude::{DataFrame, NamedFrom, SerWriter, Series};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::manifest::{compute_sha256, AttributeInfo, SplitManifest, MANIFEST_FILE};

/// Name of the leading row-index column in every attribute table.
pub const SAMPLE_COLUMN: &str = "sample";

/// Directory holding split `split` under `dataset_dir`.
pub fn split_dir(dataset_dir: &Path, split: &str) -> PathBuf {
    dataset_dir.join(sanitize_name(split))
}

/// File name used for an attribute table.
pub fn attribute_file_name(attribute: &str) -> String {
    format!("{}.arrow", sanitize_name(attribute))
}

/// Persist `samples` as split `split` under `dataset_dir`, replacing any previous copy.
pub fn write_split(dataset_dir: &Path, split: &str, samples: &SampleSet) -> BenchResult<PathBuf> {
    samples.check_consistent(split)?;
    let dir = split_dir(dataset_dir, split);
    if dir.exists() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;

    let mut manifest = SplitManifest::new(split, samples.len() as u64);
    for (name, array) in samples.iter() {
        let info = write_attribute(&dir, split, name, array)?;
        manifest.add_attribute(info);
    }

    let manifest_path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(&manifest_path, json)?;
    debug!(
        split,
        samples = samples.len(),
        path = %dir.display(),
        "wrote split"
    );
    Ok(dir)
}

fn write_attribute(
    dir: &Path,
    split: &str,
    name: &str,
    array: &AttributeArray,
) -> BenchResult<AttributeInfo> {
    let file = attribute_file_name(name);
    let path = dir.join(&file);
    let mut df = to_frame(array).map_err(|e| {
        BenchError::corrupt(split, format!("building table for '{name}': {e}"))
    })?;
    {
        let mut handle = fs::File::create(&path)?;
        IpcWriter::new(&mut handle)
            .finish(&mut df)
            .map_err(|e| BenchError::corrupt(split, format!("writing '{name}': {e}")))?;
    }
    Ok(AttributeInfo {
        name: name.to_string(),
        file,
        width: array.cols() as u64,
        row_count: array.rows() as u64,
        sha256: compute_sha256(&path)?,
        file_size_bytes: fs::metadata(&path)?.len(),
    })
}

/// Column-major frame: a leading `sample` index, then column `e<j>` for element `j`.
///
/// The index column keeps the row count recoverable for zero-width attributes.
fn to_frame(array: &AttributeArray) -> polars::prelude::PolarsResult<DataFrame> {
    let index: Vec<i64> = (0..array.rows() as i64).collect();
    let mut columns = Vec::with_capacity(array.cols() + 1);
    columns.push(Series::new(SAMPLE_COLUMN, index));
    for col in 0..array.cols() {
        let values = array.column(col).unwrap_or_default();
        columns.push(Series::new(&format!("e{col}"), values));
    }
    DataFrame::new(columns)
}

fn sanitize_name(value: &str) -> String {
    let filtered: String = value
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    if filtered.is_empty() {
        "attribute".to_string()
    } else {
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name(""), "attribute");
        assert_eq!(attribute_file_name("p_or"), "p_or.arrow");
    }
}
