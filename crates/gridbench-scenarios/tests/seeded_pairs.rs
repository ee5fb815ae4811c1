use gridbench_core::SplitName;
use gridbench_scenarios::{
    build_split_actor, build_split_simulator, BenchmarkSeeds, ScenarioProvider, SeededPair,
    SplitSelectors, StepOutcome, SyntheticGridConfig, SyntheticScenarioProvider,
};

fn provider() -> SyntheticScenarioProvider {
    SyntheticScenarioProvider::new(SyntheticGridConfig {
        steps_per_chronic: 24,
        ..SyntheticGridConfig::default()
    })
}

fn pair_for(provider: &SyntheticScenarioProvider, split: SplitName) -> SeededPair {
    let params = provider.simulator_parameters().unwrap();
    let selector = SplitSelectors::default().compile(split).unwrap();
    let simulator = build_split_simulator(provider, &params, split, &selector, 0).unwrap();
    let actor = build_split_actor(provider, split, simulator.as_ref()).unwrap();
    SeededPair::seeded(simulator, actor, BenchmarkSeeds::default().for_split(split))
}

fn rollout(pair: &mut SeededPair, steps: usize) -> Vec<StepOutcome> {
    (0..steps)
        .map(|_| {
            let action = pair.actor.act(pair.simulator.observation());
            pair.simulator.step(&action)
        })
        .collect()
}

#[test]
fn identical_seeds_give_identical_rollouts() {
    let provider = provider();
    let mut first = pair_for(&provider, SplitName::Test);
    let mut second = pair_for(&provider, SplitName::Test);
    assert_eq!(rollout(&mut first, 100), rollout(&mut second, 100));
}

#[test]
fn reseeding_restarts_the_sequence() {
    let provider = provider();
    let mut pair = pair_for(&provider, SplitName::Val);
    let before = rollout(&mut pair, 50);
    pair.reseed(BenchmarkSeeds::default().for_split(SplitName::Val));
    assert_eq!(rollout(&mut pair, 50), before);
}

#[test]
fn split_simulators_replay_disjoint_chronics() {
    let provider = provider();
    let val = pair_for(&provider, SplitName::Val);
    let ood = pair_for(&provider, SplitName::TestOodTopo);
    assert_eq!(val.simulator.chronics().len(), 50);
    assert_eq!(ood.simulator.chronics().len(), 25);
    assert!(val
        .simulator
        .chronics()
        .iter()
        .all(|c| !ood.simulator.chronics().contains(c)));
}

#[test]
fn unmatched_selector_surfaces_as_construction_error() {
    let provider = SyntheticScenarioProvider::new(SyntheticGridConfig {
        n_chronics: 100,
        ..SyntheticGridConfig::default()
    });
    let params = provider.simulator_parameters().unwrap();
    let selector = SplitSelectors::default().compile(SplitName::Val).unwrap();
    let err = build_split_simulator(&provider, &params, SplitName::Val, &selector, 0)
        .err()
        .unwrap();
    assert!(err.to_string().contains("split 'val'"));
}
