use std::fs;
use std::path::{Path, PathBuf};

use gridbench_algo::{MetricValue, ENERGY_CONSERVATION};
use gridbench_batch::{
    AugmentedSimulator, BenchmarkConfig, DatasetSplit, MeanBaseline, ObservationReplay,
    PowerGridBenchmark, DEFAULT_BATCH_SIZE, GENERATION_SUMMARY_FILE, INFERENCE_TIME,
};
use gridbench_core::{BenchError, BenchResult, Observation, SampleSet, SplitName};
use gridbench_scenarios::{
    Action, Actor, ChronicSelector, PowerGridSimulator, ScenarioProvider, SimulatorParameters,
    SyntheticGridConfig, SyntheticScenarioProvider,
};

fn small_config() -> BenchmarkConfig {
    BenchmarkConfig {
        scenario: SyntheticGridConfig {
            steps_per_chronic: 16,
            ..SyntheticGridConfig::default()
        },
        ..BenchmarkConfig::default()
    }
}

fn benchmark(config: BenchmarkConfig, root: &Path) -> PowerGridBenchmark {
    let provider = Box::new(config.provider());
    PowerGridBenchmark::new(config, provider, root).unwrap()
}

fn generated(root: &Path) -> PowerGridBenchmark {
    let mut bench = benchmark(small_config(), root);
    bench.generate(30, 10, 10, 10).unwrap();
    bench
}

#[test]
fn generate_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let bench = generated(dir.path());
    assert!(bench.is_loaded());
    assert!(bench.dataset_path().join(GENERATION_SUMMARY_FILE).exists());

    let mut fresh = benchmark(small_config(), dir.path());
    fresh.load().unwrap();
    for split in SplitName::ALL {
        assert_eq!(fresh.split(split), bench.split(split), "split {split}");
    }
    assert_eq!(fresh.split(SplitName::Train).unwrap().len(), 30);
    assert_eq!(fresh.split(SplitName::TestOodTopo).unwrap().len(), 10);
}

#[test]
fn identical_seeds_reproduce_every_split() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    let first = generated(first_dir.path());
    let second = generated(second_dir.path());
    for split in SplitName::ALL {
        assert_eq!(first.split(split), second.split(split));
    }
}

#[test]
fn regeneration_reuses_training_pair_and_replaces_data() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench = generated(dir.path());
    let before = bench.split(SplitName::Train).cloned();
    bench.generate(30, 5, 5, 5).unwrap();
    assert_eq!(bench.split(SplitName::Train).cloned(), before);
    assert_eq!(bench.split(SplitName::Val).unwrap().len(), 5);

    let staging = dir.path().join("Benchmark1.tmp");
    assert!(!staging.exists());
    let mut fresh = benchmark(small_config(), dir.path());
    fresh.load().unwrap();
    assert_eq!(fresh.split(SplitName::Test).unwrap().len(), 5);
}

#[test]
fn different_seeds_change_samples() {
    let dir = tempfile::tempdir().unwrap();
    let bench = generated(dir.path());
    let mut config = small_config();
    config.name = "Reseeded".to_string();
    config.seeds.val_env = 99;
    let mut other = benchmark(config, dir.path());
    other.generate(30, 10, 10, 10).unwrap();
    assert_ne!(other.split(SplitName::Val), bench.split(SplitName::Val));
    assert_eq!(other.split(SplitName::Test), bench.split(SplitName::Test));
}

#[test]
fn load_without_data_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench = benchmark(small_config(), dir.path());
    let err = bench.load().unwrap_err();
    assert!(matches!(err, BenchError::DataNotFound { .. }));
    assert!(!bench.is_loaded());
}

/// Counts calls so tests can assert the surrogate was never reached.
#[derive(Default)]
struct Counting {
    calls: usize,
}

impl AugmentedSimulator for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn evaluate(&mut self, dataset: &DatasetSplit, _batch_size: usize) -> BenchResult<SampleSet> {
        self.calls += 1;
        dataset.targets()
    }
}

#[test]
fn unknown_split_is_rejected_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench = generated(dir.path());
    let mut surrogate = Counting::default();
    for bogus in ["bogus", "train", "ALL"] {
        let err = bench
            .evaluate_simulator(bogus, &mut surrogate, DEFAULT_BATCH_SIZE, None, true)
            .unwrap_err();
        assert!(matches!(err, BenchError::UnknownDataset(_)));
    }
    assert_eq!(surrogate.calls, 0);
    assert!(bench.predictions(SplitName::Val).is_none());
}

#[test]
fn evaluating_before_load_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench = benchmark(small_config(), dir.path());
    let mut surrogate = Counting::default();
    let err = bench
        .evaluate_simulator("val", &mut surrogate, DEFAULT_BATCH_SIZE, None, true)
        .unwrap_err();
    assert!(matches!(err, BenchError::NotLoaded { .. }));
    assert_eq!(surrogate.calls, 0);
}

#[test]
fn evaluate_all_covers_held_out_splits() {
    let dir = tempfile::tempdir().unwrap();
    let reports = dir.path().join("reports");
    let mut bench = generated(dir.path());
    let results = bench
        .evaluate_simulator("all", &mut ObservationReplay, 8, Some(&reports), true)
        .unwrap();

    let names: Vec<&str> = results.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["test", "test_ood_topo", "val"]);
    for (split, metrics) in &results {
        let conservation = &metrics[ENERGY_CONSERVATION];
        assert_eq!(
            conservation.get("violation_percentage"),
            Some(&MetricValue::Scalar(0.0)),
            "split {split}"
        );
        assert_eq!(
            metrics["mae"].get("p_or").and_then(MetricValue::as_scalar),
            Some(0.0)
        );
        assert!(metrics.contains_key(INFERENCE_TIME));
        assert!(reports.join(format!("{split}.json")).exists());
    }
    assert!(bench.observations(SplitName::Train).is_none());
    assert_eq!(
        bench.predictions(SplitName::Val),
        bench.split(SplitName::Val).unwrap().targets().ok().as_ref()
    );
}

#[test]
fn returned_results_are_independent_copies() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench = generated(dir.path());
    let mut returned = bench
        .evaluate_simulator("test_dataset", &mut ObservationReplay, 4, None, false)
        .unwrap();
    assert!(!returned["test"].contains_key(ENERGY_CONSERVATION));
    returned.get_mut("test").unwrap().clear();
    assert!(!bench.results(SplitName::Test).unwrap().is_empty());
}

#[test]
fn mean_baseline_scores_worse_than_replay() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench = generated(dir.path());
    let mut baseline = MeanBaseline::fit(bench.split(SplitName::Train).unwrap()).unwrap();
    let results = bench
        .evaluate_simulator("val", &mut baseline, 3, None, true)
        .unwrap();
    let mae = results["val"]["mae"]
        .get("a_or")
        .and_then(MetricValue::as_scalar)
        .unwrap();
    assert!(mae > 0.0);
}

#[test]
fn stalled_generation_keeps_previous_data() {
    let dir = tempfile::tempdir().unwrap();
    generated(dir.path());

    let mut config = small_config();
    config.scenario.thermal_limit_mw = 1.0;
    config.generation.max_consecutive_rejections = 20;
    let mut bench = benchmark(config, dir.path());
    let err = bench.generate(5, 5, 5, 5).unwrap_err();
    assert!(matches!(err, BenchError::GenerationStalled { .. }));
    assert!(!bench.is_loaded());

    bench.load().unwrap();
    assert_eq!(bench.split(SplitName::Train).unwrap().len(), 30);
    assert!(!dir.path().join("Benchmark1.tmp").exists());
}

/// Provider whose configuration is missing.
struct Unconfigured;

impl ScenarioProvider for Unconfigured {
    fn simulator_parameters(&self) -> BenchResult<SimulatorParameters> {
        Err(BenchError::Config("no simulator parameters configured".into()))
    }

    fn chronic_universe(&self, _params: &SimulatorParameters) -> BenchResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn build_simulator(
        &self,
        _params: &SimulatorParameters,
        _selector: &ChronicSelector,
        _initial_chronics_id: usize,
    ) -> BenchResult<Box<dyn PowerGridSimulator>> {
        Err(BenchError::SimulatorConstruction("unreachable".into()))
    }

    fn build_training_actor(&self, _: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        Err(BenchError::SimulatorConstruction("unreachable".into()))
    }

    fn build_test_actor(&self, _: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        Err(BenchError::SimulatorConstruction("unreachable".into()))
    }

    fn build_ood_actor(&self, _: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        Err(BenchError::SimulatorConstruction("unreachable".into()))
    }
}

#[test]
fn missing_provider_configuration_fails_generation() {
    let dir = tempfile::tempdir().unwrap();
    let mut bench =
        PowerGridBenchmark::new(small_config(), Box::new(Unconfigured), dir.path()).unwrap();
    let err = bench.generate(1, 1, 1, 1).unwrap_err();
    match err {
        BenchError::SimulatorConstruction(reason) => {
            assert!(reason.contains("no simulator parameters"))
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!dir.path().join("Benchmark1").exists());
}

/// Actor that occupies the generation summary path with a directory while the
/// last split is generated, so writing `benchmark.json` fails.
struct SummaryBlocker {
    inner: Box<dyn Actor>,
    staging: PathBuf,
}

impl Actor for SummaryBlocker {
    fn seed(&mut self, seed: u64) {
        self.inner.seed(seed);
    }

    fn act(&mut self, observation: &Observation) -> Action {
        let _ = fs::create_dir_all(self.staging.join(GENERATION_SUMMARY_FILE));
        self.inner.act(observation)
    }
}

struct BlockedSummary {
    inner: SyntheticScenarioProvider,
    staging: PathBuf,
}

impl ScenarioProvider for BlockedSummary {
    fn simulator_parameters(&self) -> BenchResult<SimulatorParameters> {
        self.inner.simulator_parameters()
    }

    fn chronic_universe(&self, params: &SimulatorParameters) -> BenchResult<Vec<String>> {
        self.inner.chronic_universe(params)
    }

    fn build_simulator(
        &self,
        params: &SimulatorParameters,
        selector: &ChronicSelector,
        initial_chronics_id: usize,
    ) -> BenchResult<Box<dyn PowerGridSimulator>> {
        self.inner.build_simulator(params, selector, initial_chronics_id)
    }

    fn build_training_actor(&self, sim: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        self.inner.build_training_actor(sim)
    }

    fn build_test_actor(&self, sim: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        self.inner.build_test_actor(sim)
    }

    fn build_ood_actor(&self, sim: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        Ok(Box::new(SummaryBlocker {
            inner: self.inner.build_ood_actor(sim)?,
            staging: self.staging.clone(),
        }))
    }
}

#[test]
fn failed_summary_write_removes_staging_and_keeps_previous_data() {
    let dir = tempfile::tempdir().unwrap();
    generated(dir.path());

    let config = small_config();
    let provider = BlockedSummary {
        inner: config.provider(),
        staging: dir.path().join("Benchmark1.tmp"),
    };
    let mut bench = PowerGridBenchmark::new(config, Box::new(provider), dir.path()).unwrap();
    let err = bench.generate(5, 5, 5, 5).unwrap_err();
    assert!(matches!(err, BenchError::Io(_)), "{err:?}");
    assert!(!bench.is_loaded());

    assert!(!dir.path().join("Benchmark1.tmp").exists());
    assert!(!dir.path().join("Benchmark1.old").exists());
    let mut fresh = benchmark(small_config(), dir.path());
    fresh.load().unwrap();
    assert_eq!(fresh.split(SplitName::Train).unwrap().len(), 30);
}
