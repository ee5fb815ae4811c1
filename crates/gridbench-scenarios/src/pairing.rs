//! Seeded simulator/actor pairs, one per split.
//!
//! Every split owns two independent seeds: the environment seed drives
//! simulator-internal noise, the actor seed drives action selection. The same
//! `(environment seed, actor seed, selector)` triple always yields the same
//! sample sequence.

use gridbench_core::{BenchError, BenchResult, SplitName};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{ScenarioProvider, SimulatorParameters};
use crate::selector::ChronicSelector;
use crate::simulator::{Actor, PowerGridSimulator};

/// Environment and actor seed of one split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSeeds {
    pub env: u64,
    pub actor: u64,
}

/// The eight seeds of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSeeds {
    #[serde(default = "default_train_env")]
    pub train_env: u64,
    #[serde(default = "default_val_env")]
    pub val_env: u64,
    #[serde(default = "default_test_env")]
    pub test_env: u64,
    #[serde(default = "default_test_ood_topo_env")]
    pub test_ood_topo_env: u64,
    #[serde(default = "default_train_actor")]
    pub train_actor: u64,
    #[serde(default = "default_val_actor")]
    pub val_actor: u64,
    #[serde(default = "default_test_actor")]
    pub test_actor: u64,
    #[serde(default = "default_test_ood_topo_actor")]
    pub test_ood_topo_actor: u64,
}

fn default_train_env() -> u64 {
    1
}
fn default_val_env() -> u64 {
    2
}
fn default_test_env() -> u64 {
    3
}
fn default_test_ood_topo_env() -> u64 {
    4
}
fn default_train_actor() -> u64 {
    5
}
fn default_val_actor() -> u64 {
    6
}
fn default_test_actor() -> u64 {
    7
}
fn default_test_ood_topo_actor() -> u64 {
    8
}

impl Default for BenchmarkSeeds {
    fn default() -> Self {
        Self {
            train_env: default_train_env(),
            val_env: default_val_env(),
            test_env: default_test_env(),
            test_ood_topo_env: default_test_ood_topo_env(),
            train_actor: default_train_actor(),
            val_actor: default_val_actor(),
            test_actor: default_test_actor(),
            test_ood_topo_actor: default_test_ood_topo_actor(),
        }
    }
}

impl BenchmarkSeeds {
    pub fn for_split(&self, split: SplitName) -> SplitSeeds {
        match split {
            SplitName::Train => SplitSeeds {
                env: self.train_env,
                actor: self.train_actor,
            },
            SplitName::Val => SplitSeeds {
                env: self.val_env,
                actor: self.val_actor,
            },
            SplitName::Test => SplitSeeds {
                env: self.test_env,
                actor: self.test_actor,
            },
            SplitName::TestOodTopo => SplitSeeds {
                env: self.test_ood_topo_env,
                actor: self.test_ood_topo_actor,
            },
        }
    }
}

/// A simulator and the actor bound to it.
pub struct SeededPair {
    pub simulator: Box<dyn PowerGridSimulator>,
    pub actor: Box<dyn Actor>,
}

impl SeededPair {
    /// Seed both halves with their independent seeds.
    pub fn seeded(
        mut simulator: Box<dyn PowerGridSimulator>,
        mut actor: Box<dyn Actor>,
        seeds: SplitSeeds,
    ) -> Self {
        simulator.seed(seeds.env);
        actor.seed(seeds.actor);
        Self { simulator, actor }
    }

    /// Reseed an existing pair, restarting the simulator from its initial chronic.
    pub fn reseed(&mut self, seeds: SplitSeeds) {
        self.simulator.seed(seeds.env);
        self.actor.seed(seeds.actor);
    }
}

/// Build the simulator for `split`, mapping any failure to
/// [`BenchError::SimulatorConstruction`].
pub fn build_split_simulator(
    provider: &dyn ScenarioProvider,
    params: &SimulatorParameters,
    split: SplitName,
    selector: &ChronicSelector,
    initial_chronics_id: usize,
) -> BenchResult<Box<dyn PowerGridSimulator>> {
    let simulator = provider
        .build_simulator(params, selector, initial_chronics_id)
        .map_err(|err| construction_error(split, "simulator", err))?;
    debug!(
        split = split.as_str(),
        chronics = simulator.chronics().len(),
        "built simulator"
    );
    Ok(simulator)
}

/// Build the actor matching `split`: the training actor for `train`, the test actor
/// for `val`/`test` and the out-of-distribution actor for `test_ood_topo`.
pub fn build_split_actor(
    provider: &dyn ScenarioProvider,
    split: SplitName,
    simulator: &dyn PowerGridSimulator,
) -> BenchResult<Box<dyn Actor>> {
    let actor = match split {
        SplitName::Train => provider.build_training_actor(simulator),
        SplitName::Val | SplitName::Test => provider.build_test_actor(simulator),
        SplitName::TestOodTopo => provider.build_ood_actor(simulator),
    };
    actor.map_err(|err| construction_error(split, "actor", err))
}

fn construction_error(split: SplitName, what: &str, err: BenchError) -> BenchError {
    match err {
        BenchError::SimulatorConstruction(reason) => BenchError::SimulatorConstruction(format!(
            "{what} for split '{split}': {reason}"
        )),
        other => BenchError::SimulatorConstruction(format!("{what} for split '{split}': {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_seeds_are_eight_distinct_values() {
        let seeds = BenchmarkSeeds::default();
        let mut all: Vec<u64> = SplitName::ALL
            .iter()
            .flat_map(|s| {
                let pair = seeds.for_split(*s);
                [pair.env, pair.actor]
            })
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all, (1..=8).collect::<Vec<u64>>());
    }

    #[test]
    fn for_split_maps_env_and_actor_seeds() {
        let seeds = BenchmarkSeeds::default();
        assert_eq!(seeds.for_split(SplitName::Val), SplitSeeds { env: 2, actor: 6 });
        assert_eq!(
            seeds.for_split(SplitName::TestOodTopo),
            SplitSeeds { env: 4, actor: 8 }
        );
    }
}
