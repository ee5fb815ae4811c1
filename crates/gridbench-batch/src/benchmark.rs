//! The benchmark orchestrator: generation, loading and evaluation of the four splits.
//!
//! ```text
//! UNINITIALIZED --generate | load--> LOADED --generate | load--> LOADED
//! ```
//!
//! Generation writes every split into `<dataset_dir>.tmp` and swaps it in place of
//! `<dataset_dir>` only once all four splits were produced, so a failed run keeps
//! the previous data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use gridbench_algo::{EvaluationEngine, EvaluationOptions, MetricResults, MetricValue};
use gridbench_core::{BenchError, BenchResult, SampleSet, SplitName};
use gridbench_io::{write_report, StagedDirectory};
use gridbench_scenarios::{
    build_split_actor, build_split_simulator, ScenarioProvider, SeededPair, SimulatorParameters,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::augmented::AugmentedSimulator;
use crate::config::BenchmarkConfig;
use crate::dataset::DatasetSplit;

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Written next to the splits after a successful generation.
pub const GENERATION_SUMMARY_FILE: &str = "benchmark.json";

/// Key under which the surrogate wall time is reported per split.
pub const INFERENCE_TIME: &str = "inference_time_seconds";

/// Record of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub benchmark: String,
    pub env_name: String,
    pub created_at: DateTime<Utc>,
    /// Requested and produced samples per split
    pub samples: BTreeMap<SplitName, usize>,
    /// Chronics replayed per split
    pub chronics: BTreeMap<SplitName, usize>,
    pub config: BenchmarkConfig,
}

/// Split name to metric results.
pub type BenchmarkResults = BTreeMap<String, MetricResults>;

pub struct PowerGridBenchmark {
    config: BenchmarkConfig,
    provider: Box<dyn ScenarioProvider>,
    dataset_path: PathBuf,
    splits: BTreeMap<SplitName, DatasetSplit>,
    training_pair: Option<SeededPair>,
    engine: EvaluationEngine,
    observations: BTreeMap<SplitName, SampleSet>,
    predictions: BTreeMap<SplitName, SampleSet>,
    results: BTreeMap<SplitName, MetricResults>,
    is_loaded: bool,
}

impl PowerGridBenchmark {
    /// Create an empty benchmark persisted under `<benchmark_path>/<config.name>`.
    pub fn new(
        config: BenchmarkConfig,
        provider: Box<dyn ScenarioProvider>,
        benchmark_path: impl AsRef<Path>,
    ) -> BenchResult<Self> {
        config.validate()?;
        let engine = EvaluationEngine::from_settings(&config.eval, &config.attr_y)?;
        let dataset_path = benchmark_path.as_ref().join(&config.name);
        let splits = empty_splits(&config);
        Ok(Self {
            config,
            provider,
            dataset_path,
            splits,
            training_pair: None,
            engine,
            observations: BTreeMap::new(),
            predictions: BTreeMap::new(),
            results: BTreeMap::new(),
            is_loaded: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub fn split(&self, name: SplitName) -> Option<&DatasetSplit> {
        self.splits.get(&name)
    }

    /// Observations handed to the most recent evaluation of `name`.
    pub fn observations(&self, name: SplitName) -> Option<&SampleSet> {
        self.observations.get(&name)
    }

    /// Surrogate predictions from the most recent evaluation of `name`.
    pub fn predictions(&self, name: SplitName) -> Option<&SampleSet> {
        self.predictions.get(&name)
    }

    /// Metric results of the most recent evaluation of `name`.
    pub fn results(&self, name: SplitName) -> Option<&MetricResults> {
        self.results.get(&name)
    }

    /// Generate the four splits with the requested sample counts, replacing both
    /// the in-memory and the persisted data.
    pub fn generate(
        &mut self,
        n_train: usize,
        n_val: usize,
        n_test: usize,
        n_test_ood_topo: usize,
    ) -> BenchResult<()> {
        if self.is_loaded {
            warn!(
                benchmark = %self.config.name,
                path = %self.dataset_path.display(),
                "benchmark already holds data; it will be replaced"
            );
        }

        let params = self.simulator_parameters()?;
        let universe = self
            .provider
            .chronic_universe(&params)
            .map_err(|e| BenchError::SimulatorConstruction(format!("chronic universe: {e}")))?;
        let partition = self.config.selectors.partition(&universe)?;
        debug!(
            universe = universe.len(),
            train = partition.train.len(),
            val = partition.val.len(),
            test = partition.test.len(),
            test_ood_topo = partition.test_ood_topo.len(),
            "partitioned chronics"
        );
        let unassigned = partition.excluded(&universe);
        if !unassigned.is_empty() {
            warn!(
                count = unassigned.len(),
                first = unassigned[0],
                "chronics not selected by any split"
            );
        }

        let mut train_pair = match self.training_pair.take() {
            Some(pair) => pair,
            None => self.build_pair(&params, SplitName::Train)?,
        };
        train_pair.reseed(self.config.seeds.for_split(SplitName::Train));

        let outcome = self.generate_splits(
            &params,
            &mut train_pair,
            [
                (SplitName::Train, n_train),
                (SplitName::Val, n_val),
                (SplitName::Test, n_test),
                (SplitName::TestOodTopo, n_test_ood_topo),
            ],
        );
        self.training_pair = Some(train_pair);
        let splits = outcome?;

        self.splits = splits;
        self.observations.clear();
        self.predictions.clear();
        self.results.clear();
        self.is_loaded = true;
        info!(
            benchmark = %self.config.name,
            path = %self.dataset_path.display(),
            "generation complete"
        );
        Ok(())
    }

    fn generate_splits(
        &self,
        params: &SimulatorParameters,
        train_pair: &mut SeededPair,
        counts: [(SplitName, usize); 4],
    ) -> BenchResult<BTreeMap<SplitName, DatasetSplit>> {
        // Build every pair before touching the disk
        let mut pairs = BTreeMap::new();
        for (split, _) in counts {
            if split != SplitName::Train {
                pairs.insert(split, self.build_pair(params, split)?);
            }
        }

        let staging = StagedDirectory::new(&self.dataset_path)?;
        let mut generated = BTreeMap::new();
        let mut summary_chronics = BTreeMap::new();
        for (split, n_samples) in counts {
            let pair = match pairs.get_mut(&split) {
                Some(pair) => pair,
                None => &mut *train_pair,
            };
            let mut dataset = DatasetSplit::new(split, self.config.groups());
            // Any early return drops `staging`, which removes the uncommitted directory
            dataset.generate(
                pair.simulator.as_mut(),
                pair.actor.as_mut(),
                staging.temp_dir(),
                n_samples,
                self.config.generation.max_consecutive_rejections,
            )?;
            summary_chronics.insert(split, pair.simulator.chronics().len());
            generated.insert(split, dataset);
        }

        let summary = GenerationSummary {
            benchmark: self.config.name.clone(),
            env_name: params.env_name.clone(),
            created_at: Utc::now(),
            samples: generated.iter().map(|(s, d)| (*s, d.len())).collect(),
            chronics: summary_chronics,
            config: self.config.clone(),
        };
        write_report(&staging.temp_dir().join(GENERATION_SUMMARY_FILE), &summary)?;
        staging.commit()?;
        Ok(generated)
    }

    /// Load the four splits persisted under [`Self::dataset_path`].
    pub fn load(&mut self) -> BenchResult<()> {
        if !self.dataset_path.is_dir() {
            return Err(BenchError::DataNotFound {
                path: self.dataset_path.clone(),
            });
        }
        let mut splits = empty_splits(&self.config);
        for split in splits.values_mut() {
            split.load(&self.dataset_path)?;
        }
        self.splits = splits;
        self.observations.clear();
        self.predictions.clear();
        self.results.clear();
        self.is_loaded = true;
        info!(
            benchmark = %self.config.name,
            path = %self.dataset_path.display(),
            "benchmark loaded"
        );
        Ok(())
    }

    /// Evaluate `surrogate` on the splits named by `dataset`.
    ///
    /// `dataset` is `"all"` (val, test, test_ood_topo in that order) or one split
    /// name, optionally with a `_dataset` suffix. With `save_path`, each split's
    /// report is written to `<save_path>/<split>.json`. Caches for a split are
    /// only updated once its evaluation succeeded.
    pub fn evaluate_simulator(
        &mut self,
        dataset: &str,
        surrogate: &mut dyn AugmentedSimulator,
        batch_size: usize,
        save_path: Option<&Path>,
        active_flow: bool,
    ) -> BenchResult<BenchmarkResults> {
        let selected = SplitName::parse_selector(dataset)?;
        let mut results = BenchmarkResults::new();

        for split in selected {
            let populated = self.splits.get(&split).is_some_and(DatasetSplit::is_populated);
            if !populated {
                return Err(BenchError::NotLoaded {
                    split: split.to_string(),
                });
            }
            let training = self.training_simulator()?;
            surrogate.prepare(training.simulator.as_ref())?;

            let data = self.splits.get(&split).ok_or_else(|| BenchError::NotLoaded {
                split: split.to_string(),
            })?;
            let started = Instant::now();
            let predictions = surrogate.evaluate(data, batch_size)?;
            let inference_time = started.elapsed().as_secs_f64();
            let observations = data.data().clone();

            let mut options = EvaluationOptions {
                active_flow,
                save_path: save_path.map(|dir| dir.join(format!("{split}.json"))),
                ..EvaluationOptions::default()
            };
            options
                .extra
                .insert(INFERENCE_TIME.to_string(), MetricValue::Scalar(inference_time));
            let metrics = self.engine.evaluate(&observations, &predictions, &options)?;
            info!(
                split = split.as_str(),
                surrogate = surrogate.name(),
                inference_time,
                "evaluated split"
            );

            self.observations.insert(split, observations);
            self.predictions.insert(split, predictions);
            self.results.insert(split, metrics.clone());
            results.insert(split.as_str().to_string(), metrics);
        }
        Ok(results)
    }

    /// Training pair, built on first use.
    fn training_simulator(&mut self) -> BenchResult<&SeededPair> {
        if self.training_pair.is_none() {
            let params = self.simulator_parameters()?;
            let pair = self.build_pair(&params, SplitName::Train)?;
            self.training_pair = Some(pair);
        }
        self.training_pair
            .as_ref()
            .ok_or_else(|| BenchError::SimulatorConstruction("training simulator".to_string()))
    }

    fn simulator_parameters(&self) -> BenchResult<SimulatorParameters> {
        self.provider.simulator_parameters().map_err(|e| match e {
            BenchError::SimulatorConstruction(_) => e,
            other => BenchError::SimulatorConstruction(format!("simulator parameters: {other}")),
        })
    }

    fn build_pair(&self, params: &SimulatorParameters, split: SplitName) -> BenchResult<SeededPair> {
        let selector = self.config.selectors.compile(split)?;
        let simulator = build_split_simulator(
            self.provider.as_ref(),
            params,
            split,
            &selector,
            self.config.initial_chronics_id,
        )?;
        let actor = build_split_actor(self.provider.as_ref(), split, simulator.as_ref())?;
        Ok(SeededPair::seeded(
            simulator,
            actor,
            self.config.seeds.for_split(split),
        ))
    }
}

fn empty_splits(config: &BenchmarkConfig) -> BTreeMap<SplitName, DatasetSplit> {
    SplitName::ALL
        .iter()
        .map(|split| (*split, DatasetSplit::new(*split, config.groups())))
        .collect()
}

impl std::fmt::Debug for PowerGridBenchmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerGridBenchmark")
            .field("name", &self.config.name)
            .field("dataset_path", &self.dataset_path)
            .field("is_loaded", &self.is_loaded)
            .field("training_pair", &self.training_pair.is_some())
            .finish()
    }
}
