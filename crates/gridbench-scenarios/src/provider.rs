//! Scenario-specific construction of simulators and actors.

use gridbench_core::BenchResult;
use serde::{Deserialize, Serialize};

use crate::selector::ChronicSelector;
use crate::simulator::{Actor, PowerGridSimulator};

/// Backend construction parameters handed from a provider to its simulator factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorParameters {
    /// Backend environment name
    pub env_name: String,
    /// Backend-specific options
    #[serde(default)]
    pub options: serde_json::Value,
}

/// Strategy supplying everything scenario-specific to a benchmark: simulator
/// parameters, the chronic universe, and the actor used for each kind of split.
pub trait ScenarioProvider {
    fn simulator_parameters(&self) -> BenchResult<SimulatorParameters>;

    /// Every chronic the backend can replay, in index order.
    fn chronic_universe(&self, params: &SimulatorParameters) -> BenchResult<Vec<String>>;

    fn build_simulator(
        &self,
        params: &SimulatorParameters,
        selector: &ChronicSelector,
        initial_chronics_id: usize,
    ) -> BenchResult<Box<dyn PowerGridSimulator>>;

    fn build_training_actor(
        &self,
        simulator: &dyn PowerGridSimulator,
    ) -> BenchResult<Box<dyn Actor>>;

    fn build_test_actor(&self, simulator: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>>;

    fn build_ood_actor(&self, simulator: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>>;
}
