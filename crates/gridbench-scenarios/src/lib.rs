//! Scenario plumbing for gridbench: chronic selectors, the simulator and actor
//! capabilities, per-split seeded pairs, and a deterministic synthetic backend.

pub mod pairing;
pub mod provider;
pub mod selector;
pub mod simulator;
pub mod spec;
pub mod synthetic;

pub use pairing::{build_split_actor, build_split_simulator, BenchmarkSeeds, SeededPair, SplitSeeds};
pub use provider::{ScenarioProvider, SimulatorParameters};
pub use selector::{chronic_names, ChronicSelector, SelectorSpec, SplitPartition, SplitSelectors};
pub use simulator::{Action, Actor, GridMetadata, PowerGridSimulator, StepOutcome};
pub use spec::load_scenario_config;
pub use synthetic::{
    RandomTopologyActor, SyntheticGridConfig, SyntheticGridSimulator, SyntheticScenarioProvider,
    TopologyRegime,
};
