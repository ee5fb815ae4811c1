//! Benchmark configuration read from TOML.
//!
//! ```toml
//! [benchmarks.Benchmark1]
//! attr_x = ["prod_p", "prod_v", "load_p", "load_q"]
//! attr_tau = ["line_status", "topo_vect"]
//! attr_y = ["a_or", "a_ex", "p_or", "p_ex", "v_or", "v_ex"]
//!
//! [benchmarks.Benchmark1.seeds]
//! train_env = 1
//!
//! [benchmarks.Benchmark1.eval]
//! metrics = ["mae", "energy_conservation"]
//! ```
//!
//! Every field has a default, so an empty table is a valid benchmark.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use gridbench_algo::EvaluationSettings;
use gridbench_core::{AttributeGroups, BenchError, BenchResult, SplitName};
use gridbench_scenarios::{BenchmarkSeeds, SplitSelectors, SyntheticGridConfig, SyntheticScenarioProvider};
use serde::{Deserialize, Serialize};

/// Name of the built-in benchmark.
pub const DEFAULT_BENCHMARK: &str = "Benchmark1";

/// Generation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Rejected steps in a row after which generation gives up
    #[serde(default = "default_max_consecutive_rejections")]
    pub max_consecutive_rejections: usize,
}

fn default_max_consecutive_rejections() -> usize {
    1000
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_consecutive_rejections: default_max_consecutive_rejections(),
        }
    }
}

/// One `[benchmarks.<name>]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Filled from the table key
    #[serde(skip)]
    pub name: String,
    #[serde(default = "default_attr_x")]
    pub attr_x: Vec<String>,
    #[serde(default = "default_attr_tau")]
    pub attr_tau: Vec<String>,
    #[serde(default = "default_attr_y")]
    pub attr_y: Vec<String>,
    #[serde(default)]
    pub initial_chronics_id: usize,
    #[serde(default)]
    pub seeds: BenchmarkSeeds,
    #[serde(default)]
    pub selectors: SplitSelectors,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub eval: EvaluationSettings,
    #[serde(default)]
    pub scenario: SyntheticGridConfig,
}

fn default_attr_x() -> Vec<String> {
    AttributeGroups::default().attr_x
}

fn default_attr_tau() -> Vec<String> {
    AttributeGroups::default().attr_tau
}

fn default_attr_y() -> Vec<String> {
    AttributeGroups::default().attr_y
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_BENCHMARK.to_string(),
            attr_x: default_attr_x(),
            attr_tau: default_attr_tau(),
            attr_y: default_attr_y(),
            initial_chronics_id: 0,
            seeds: BenchmarkSeeds::default(),
            selectors: SplitSelectors::default(),
            generation: GenerationSettings::default(),
            eval: EvaluationSettings::default(),
            scenario: SyntheticGridConfig::default(),
        }
    }
}

impl BenchmarkConfig {
    pub fn groups(&self) -> AttributeGroups {
        AttributeGroups::new(self.attr_x.clone(), self.attr_tau.clone(), self.attr_y.clone())
    }

    /// Scenario provider for the configured synthetic backend.
    pub fn provider(&self) -> SyntheticScenarioProvider {
        SyntheticScenarioProvider::new(self.scenario.clone())
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.attr_y.is_empty() {
            return Err(BenchError::Config(format!(
                "benchmark '{}' has no target attributes (attr_y)",
                self.name
            )));
        }
        let all = self.groups().all();
        for (idx, name) in all.iter().enumerate() {
            if all[..idx].contains(name) {
                return Err(BenchError::Config(format!(
                    "attribute '{name}' is listed more than once in benchmark '{}'",
                    self.name
                )));
            }
        }
        if self.generation.max_consecutive_rejections == 0 {
            return Err(BenchError::Config(
                "generation.max_consecutive_rejections must be at least 1".to_string(),
            ));
        }
        for split in SplitName::ALL {
            self.selectors.compile(split)?;
        }
        Ok(())
    }
}

/// Top-level layout of a benchmark configuration file.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BenchmarkFile {
    #[serde(default)]
    pub benchmarks: BTreeMap<String, BenchmarkConfig>,
}

impl BenchmarkFile {
    pub fn from_toml(text: &str) -> BenchResult<Self> {
        let mut file: BenchmarkFile = toml::from_str(text)
            .map_err(|e| BenchError::Parse(format!("benchmark configuration: {e}")))?;
        for (name, config) in file.benchmarks.iter_mut() {
            config.name = name.clone();
        }
        Ok(file)
    }

    pub fn benchmark(&self, name: &str) -> BenchResult<BenchmarkConfig> {
        let config = self.benchmarks.get(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.benchmarks.keys().map(String::as_str).collect();
            BenchError::Config(format!(
                "benchmark '{name}' not found (available: {})",
                known.join(", ")
            ))
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Read benchmark `name` from the TOML file at `path`.
pub fn load_benchmark_config(path: &Path, name: &str) -> BenchResult<BenchmarkConfig> {
    let text = fs::read_to_string(path)?;
    BenchmarkFile::from_toml(&text)?.benchmark(name)
}
