//! Unified error types for the gridbench workspace
//!
//! This module provides a common error type [`BenchError`] that every library
//! crate returns. The dataset, scenario, and evaluation layers map their
//! failures onto one of these variants so callers can match on the failure
//! class (missing data, unknown split, corrupt files, ...) without caring which
//! crate produced it.
//!
//! # Example
//!
//! ```ignore
//! use gridbench_core::{BenchError, BenchResult};
//!
//! fn reload(bench: &mut PowerGridBenchmark) -> BenchResult<()> {
//!     match bench.load() {
//!         Err(BenchError::DataNotFound { .. }) => bench.generate(100, 10, 10, 10),
//!         other => other,
//!     }
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for all gridbench operations.
#[derive(Error, Debug)]
pub enum BenchError {
    /// `load()` was called but nothing is persisted at the expected location
    #[error("No data found in {}. Have you generated or downloaded some data?", path.display())]
    DataNotFound { path: PathBuf },

    /// The split selector given to an evaluation is not recognized
    #[error("Unknown dataset {0}")]
    UnknownDataset(String),

    /// Persisted split data is incomplete or inconsistent
    #[error("Corrupt data in split '{split}': {reason}")]
    CorruptData { split: String, reason: String },

    /// A simulator or actor could not be built from the scenario provider
    #[error("Simulator construction failed: {0}")]
    SimulatorConstruction(String),

    /// The simulator kept rejecting steps and the sample quota could not be met
    #[error(
        "Generation stalled for split '{split}': {collected}/{requested} samples after {rejections} consecutive rejected steps"
    )]
    GenerationStalled {
        split: String,
        collected: usize,
        requested: usize,
        rejections: usize,
    },

    /// A split was evaluated before it was generated or loaded
    #[error("Split '{split}' holds no data; call generate() or load() first")]
    NotLoaded { split: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shape or value validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (file access, directory swaps, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using BenchError.
pub type BenchResult<T> = Result<T, BenchError>;

impl BenchError {
    /// Shorthand for a [`BenchError::CorruptData`] on the given split.
    pub fn corrupt(split: impl Into<String>, reason: impl Into<String>) -> Self {
        BenchError::CorruptData {
            split: split.into(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for BenchError {
    fn from(err: anyhow::Error) -> Self {
        BenchError::Other(format!("{err:#}"))
    }
}

impl From<String> for BenchError {
    fn from(s: String) -> Self {
        BenchError::Other(s)
    }
}

impl From<&str> for BenchError {
    fn from(s: &str) -> Self {
        BenchError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_not_found_mentions_path() {
        let err = BenchError::DataNotFound {
            path: PathBuf::from("/tmp/bench/Benchmark1"),
        };
        assert!(err.to_string().contains("/tmp/bench/Benchmark1"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BenchError = io_err.into();
        assert!(matches!(err, BenchError::Io(_)));
    }

    #[test]
    fn corrupt_helper_keeps_split_name() {
        let err = BenchError::corrupt("val", "attribute 'p_or' missing");
        match err {
            BenchError::CorruptData { split, reason } => {
                assert_eq!(split, "val");
                assert!(reason.contains("p_or"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn question_mark_operator() {
        fn inner() -> BenchResult<()> {
            Err(BenchError::UnknownDataset("bogus".into()))
        }

        fn outer() -> BenchResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(BenchError::UnknownDataset(_))));
    }
}
