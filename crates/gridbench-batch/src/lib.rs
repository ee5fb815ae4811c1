//! Benchmark orchestration for gridbench.
//!
//! [`PowerGridBenchmark`] owns the four [`DatasetSplit`]s of a benchmark,
//! generates them from seeded simulator/actor pairs, loads them back from disk
//! and evaluates [`AugmentedSimulator`]s against them.

pub mod augmented;
pub mod benchmark;
pub mod config;
pub mod dataset;

pub use augmented::{AugmentedSimulator, MeanBaseline, ObservationReplay};
pub use benchmark::{
    BenchmarkResults, GenerationSummary, PowerGridBenchmark, DEFAULT_BATCH_SIZE,
    GENERATION_SUMMARY_FILE, INFERENCE_TIME,
};
pub use config::{
    load_benchmark_config, BenchmarkConfig, BenchmarkFile, GenerationSettings, DEFAULT_BENCHMARK,
};
pub use dataset::DatasetSplit;
