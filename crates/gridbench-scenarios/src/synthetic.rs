//! Deterministic synthetic grid backend.
//!
//! The grid is a single aggregated area: loads follow a daily profile recorded
//! per chronic, active power is spread over the connected lines in proportion to
//! their topology-dependent weights, each line dissipates `k * flow^2` of losses,
//! and generators cover `load + losses` pro rata of their capacity. Every accepted
//! state therefore satisfies `sum(prod_p) = sum(load_p) + sum(p_or + p_ex)`.
//!
//! A step is rejected when more than `max_disconnected_lines` lines are out, when
//! no line is left in service, or when a line exceeds its thermal limit. After a
//! rejection the simulator recovers to the reference topology.

use std::f64::consts::PI;

use gridbench_core::{BenchError, BenchResult, Observation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::provider::{ScenarioProvider, SimulatorParameters};
use crate::selector::{chronic_names, ChronicSelector};
use crate::simulator::{Action, Actor, GridMetadata, PowerGridSimulator, StepOutcome};

/// Bus-2 assignment scales a line end's weight by this factor.
const BUS_TWO_WEIGHT: f64 = 0.6;

/// Parameters of the synthetic backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticGridConfig {
    pub env_name: String,
    pub n_gen: usize,
    pub n_load: usize,
    pub n_line: usize,
    /// Size of the chronic universe
    pub n_chronics: usize,
    /// Steps replayed per chronic before moving to the next one
    pub steps_per_chronic: usize,
    pub base_load_mw: f64,
    /// Relative amplitude of the daily load cycle
    pub daily_amplitude: f64,
    /// Half-width of the uniform multiplicative load noise
    pub noise: f64,
    /// Line losses are `loss_coefficient * flow^2` (MW)
    pub loss_coefficient: f64,
    pub thermal_limit_mw: f64,
    pub max_disconnected_lines: usize,
    pub base_kv: f64,
    /// Seed of the recorded chronic data (not of the environment noise)
    pub seed: u64,
    /// Probability that an actor applies a topology change on a given step
    pub actor_action_probability: f64,
}

impl Default for SyntheticGridConfig {
    fn default() -> Self {
        Self {
            env_name: "synthetic_grid".to_string(),
            n_gen: 3,
            n_load: 5,
            n_line: 8,
            n_chronics: 1000,
            steps_per_chronic: 288,
            base_load_mw: 30.0,
            daily_amplitude: 0.25,
            noise: 0.02,
            loss_coefficient: 1e-3,
            thermal_limit_mw: 60.0,
            max_disconnected_lines: 2,
            base_kv: 138.0,
            seed: 0,
            actor_action_probability: 0.3,
        }
    }
}

impl SyntheticGridConfig {
    pub fn validate(&self) -> BenchResult<()> {
        let counts = [
            ("n_gen", self.n_gen),
            ("n_load", self.n_load),
            ("n_line", self.n_line),
            ("n_chronics", self.n_chronics),
            ("steps_per_chronic", self.steps_per_chronic),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(BenchError::Config(format!("{name} must be at least 1")));
            }
        }
        if !(self.thermal_limit_mw > 0.0) || !(self.base_kv > 0.0) {
            return Err(BenchError::Config(
                "thermal_limit_mw and base_kv must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.actor_action_probability) {
            return Err(BenchError::Config(
                "actor_action_probability must lie in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    pub fn metadata(&self) -> GridMetadata {
        GridMetadata {
            n_gen: self.n_gen,
            n_load: self.n_load,
            n_line: self.n_line,
            dim_topo: 2 * self.n_line,
        }
    }

    fn from_parameters(params: &SimulatorParameters) -> BenchResult<Self> {
        let config: SyntheticGridConfig = serde_json::from_value(params.options.clone())
            .map_err(|e| {
                BenchError::SimulatorConstruction(format!(
                    "invalid options for '{}': {e}",
                    params.env_name
                ))
            })?;
        config.validate()?;
        Ok(config)
    }
}

/// Recorded exogenous conditions of one chronic.
#[derive(Debug, Clone, PartialEq)]
struct ChronicProfile {
    load_scale: Vec<f64>,
    phase: f64,
    amplitude: f64,
}

impl ChronicProfile {
    fn recorded(config: &SyntheticGridConfig, chronic: &str) -> Self {
        let key = chronic_key(chronic);
        let mut rng = StdRng::seed_from_u64(config.seed ^ key.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let load_scale = (0..config.n_load)
            .map(|_| rng.gen_range(0.7..1.3))
            .collect();
        Self {
            load_scale,
            phase: rng.gen_range(0.0..2.0 * PI),
            amplitude: config.daily_amplitude * rng.gen_range(0.5..1.5),
        }
    }
}

/// Numeric index of a chronic name, or a stable byte hash for non-numeric names.
fn chronic_key(chronic: &str) -> u64 {
    chronic.parse::<u64>().unwrap_or_else(|_| {
        chronic
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
                (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            })
    })
}

/// Line status and bus assignment of every line end.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Topology {
    line_status: Vec<bool>,
    buses: Vec<u8>,
}

impl Topology {
    fn reference(n_line: usize) -> Self {
        Self {
            line_status: vec![true; n_line],
            buses: vec![1; 2 * n_line],
        }
    }

    fn apply(&self, action: &Action) -> Result<Self, String> {
        let mut next = self.clone();
        for &(line, connected) in &action.set_line_status {
            let slot = next
                .line_status
                .get_mut(line)
                .ok_or_else(|| format!("line {line} does not exist"))?;
            *slot = connected;
        }
        for &(position, bus) in &action.set_bus {
            if !matches!(bus, 1 | 2) {
                return Err(format!("bus {bus} is not 1 or 2"));
            }
            let slot = next
                .buses
                .get_mut(position)
                .ok_or_else(|| format!("topology position {position} does not exist"))?;
            *slot = bus;
        }
        Ok(next)
    }

    fn disconnected(&self) -> usize {
        self.line_status.iter().filter(|connected| !**connected).count()
    }
}

/// Ground-truth simulator over the chronics accepted by a selector.
pub struct SyntheticGridSimulator {
    config: SyntheticGridConfig,
    chronics: Vec<String>,
    initial_position: usize,
    position: usize,
    step_in_chronic: usize,
    profile: ChronicProfile,
    topology: Topology,
    rng: StdRng,
    observation: Observation,
}

impl SyntheticGridSimulator {
    pub fn new(
        config: SyntheticGridConfig,
        selector: &ChronicSelector,
        initial_chronics_id: usize,
    ) -> BenchResult<Self> {
        config.validate()?;
        let universe = chronic_names(config.n_chronics);
        let chronics: Vec<String> = selector
            .select(&universe)
            .into_iter()
            .map(str::to_string)
            .collect();
        if chronics.is_empty() {
            return Err(BenchError::SimulatorConstruction(format!(
                "selector {selector:?} matches none of the {} chronics",
                universe.len()
            )));
        }
        let initial_position = initial_chronics_id % chronics.len();
        let profile = ChronicProfile::recorded(&config, &chronics[initial_position]);
        let topology = Topology::reference(config.n_line);
        let mut simulator = Self {
            config,
            chronics,
            initial_position,
            position: initial_position,
            step_in_chronic: 0,
            profile,
            topology,
            rng: StdRng::seed_from_u64(0),
            observation: Observation::new(),
        };
        simulator.reset();
        Ok(simulator)
    }

    /// Chronic currently replayed.
    pub fn current_chronic(&self) -> &str {
        &self.chronics[self.position]
    }

    fn reset(&mut self) {
        self.position = self.initial_position;
        self.step_in_chronic = 0;
        self.profile = ChronicProfile::recorded(&self.config, &self.chronics[self.position]);
        self.topology = Topology::reference(self.config.n_line);
        let noise = self.draw_noise();
        let (observation, _) = self.solve(&self.topology, &noise);
        self.observation = observation;
    }

    fn advance_time(&mut self) {
        self.step_in_chronic += 1;
        if self.step_in_chronic >= self.config.steps_per_chronic {
            self.position = (self.position + 1) % self.chronics.len();
            self.step_in_chronic = 0;
            self.profile = ChronicProfile::recorded(&self.config, &self.chronics[self.position]);
            self.topology = Topology::reference(self.config.n_line);
        }
    }

    fn draw_noise(&mut self) -> Vec<f64> {
        let noise = self.config.noise;
        (0..self.config.n_load)
            .map(|_| {
                if noise > 0.0 {
                    1.0 + self.rng.gen_range(-noise..=noise)
                } else {
                    1.0
                }
            })
            .collect()
    }

    /// Power flow for `topology` at the current time step. Returns the state and,
    /// if the state is not acceptable, the reason.
    fn solve(&self, topology: &Topology, noise: &[f64]) -> (Observation, Option<String>) {
        let cfg = &self.config;
        let angle = 2.0 * PI * self.step_in_chronic as f64 / cfg.steps_per_chronic as f64
            + self.profile.phase;
        let cycle = 1.0 + self.profile.amplitude * angle.sin();

        let load_p: Vec<f64> = self
            .profile
            .load_scale
            .iter()
            .zip(noise)
            .map(|(scale, eps)| cfg.base_load_mw * scale * cycle * eps)
            .collect();
        let load_q: Vec<f64> = load_p.iter().map(|p| 0.3 * p).collect();
        let total_load: f64 = load_p.iter().sum();

        let weights: Vec<f64> = (0..cfg.n_line)
            .map(|line| {
                if !topology.line_status[line] {
                    return 0.0;
                }
                let end_factor = |bus: u8| if bus == 2 { BUS_TWO_WEIGHT } else { 1.0 };
                (1.0 + 0.5 * (line % 3) as f64)
                    * end_factor(topology.buses[2 * line])
                    * end_factor(topology.buses[2 * line + 1])
            })
            .collect();
        let total_weight: f64 = weights.iter().sum();

        let mut violation = None;
        if topology.disconnected() > cfg.max_disconnected_lines {
            violation = Some(format!(
                "{} lines disconnected (at most {} allowed)",
                topology.disconnected(),
                cfg.max_disconnected_lines
            ));
        } else if total_weight <= 0.0 {
            violation = Some("no line in service".to_string());
        }

        let mut p_or = vec![0.0; cfg.n_line];
        let mut p_ex = vec![0.0; cfg.n_line];
        let mut v_or = vec![0.0; cfg.n_line];
        let mut v_ex = vec![0.0; cfg.n_line];
        let mut total_loss = 0.0;
        for line in 0..cfg.n_line {
            if weights[line] <= 0.0 || total_weight <= 0.0 {
                continue;
            }
            let direction = if line % 2 == 0 { 1.0 } else { -1.0 };
            let flow = direction * total_load * weights[line] / total_weight;
            let loss = cfg.loss_coefficient * flow * flow;
            total_loss += loss;
            // Losses are charged to the sending end
            if flow >= 0.0 {
                p_or[line] = flow + loss;
                p_ex[line] = -flow;
            } else {
                p_or[line] = flow;
                p_ex[line] = -flow + loss;
            }
            let loading = flow.abs() / cfg.thermal_limit_mw;
            v_or[line] = cfg.base_kv * (1.0 - 0.02 * loading);
            v_ex[line] = cfg.base_kv * (1.0 - 0.03 * loading);
            if violation.is_none() && flow.abs() > cfg.thermal_limit_mw {
                violation = Some(format!(
                    "line {line} overloaded ({:.1} MW > {:.1} MW)",
                    flow.abs(),
                    cfg.thermal_limit_mw
                ));
            }
        }

        let total_production = total_load + total_loss;
        let capacity_total = (cfg.n_gen * (cfg.n_gen + 1) / 2) as f64;
        let prod_p: Vec<f64> = (0..cfg.n_gen)
            .map(|gen| total_production * (gen + 1) as f64 / capacity_total)
            .collect();
        let prod_v: Vec<f64> = (0..cfg.n_gen)
            .map(|gen| cfg.base_kv * (1.0 + 0.01 * (gen % 3) as f64))
            .collect();

        let current = |p: f64, v: f64| if v > 0.0 { 1000.0 * p.abs() / (3f64.sqrt() * v) } else { 0.0 };
        let a_or: Vec<f64> = p_or.iter().zip(&v_or).map(|(p, v)| current(*p, *v)).collect();
        let a_ex: Vec<f64> = p_ex.iter().zip(&v_ex).map(|(p, v)| current(*p, *v)).collect();

        let line_status: Vec<f64> = topology
            .line_status
            .iter()
            .map(|connected| if *connected { 1.0 } else { 0.0 })
            .collect();
        let topo_vect: Vec<f64> = topology
            .buses
            .iter()
            .enumerate()
            .map(|(pos, bus)| {
                if topology.line_status[pos / 2] {
                    f64::from(*bus)
                } else {
                    -1.0
                }
            })
            .collect();

        let observation = Observation::new()
            .with("prod_p", prod_p)
            .with("prod_v", prod_v)
            .with("load_p", load_p)
            .with("load_q", load_q)
            .with("line_status", line_status)
            .with("topo_vect", topo_vect)
            .with("p_or", p_or)
            .with("p_ex", p_ex)
            .with("a_or", a_or)
            .with("a_ex", a_ex)
            .with("v_or", v_or)
            .with("v_ex", v_ex);
        (observation, violation)
    }
}

impl PowerGridSimulator for SyntheticGridSimulator {
    fn name(&self) -> &str {
        &self.config.env_name
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.reset();
    }

    fn metadata(&self) -> GridMetadata {
        self.config.metadata()
    }

    fn chronics(&self) -> &[String] {
        &self.chronics
    }

    fn observation(&self) -> &Observation {
        &self.observation
    }

    fn step(&mut self, action: &Action) -> StepOutcome {
        self.advance_time();
        let noise = self.draw_noise();
        let candidate = match self.topology.apply(action) {
            Ok(topology) => topology,
            Err(reason) => {
                trace!(%reason, "invalid action");
                return StepOutcome::Rejected { reason };
            }
        };
        let (observation, violation) = self.solve(&candidate, &noise);
        match violation {
            Some(reason) => {
                trace!(chronic = self.current_chronic(), %reason, "step rejected");
                self.topology = Topology::reference(self.config.n_line);
                StepOutcome::Rejected { reason }
            }
            None => {
                self.topology = candidate;
                self.observation = observation.clone();
                StepOutcome::Accepted(observation)
            }
        }
    }
}

/// Which family of topology changes an actor draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyRegime {
    /// Single changes on the first half of the lines (train, val, test)
    InDistribution,
    /// Paired changes touching the second half of the lines, never seen in training
    OutOfDistribution,
}

/// Random topology policy with recovery towards the reference topology.
pub struct RandomTopologyActor {
    regime: TopologyRegime,
    n_line: usize,
    action_probability: f64,
    rng: StdRng,
}

impl RandomTopologyActor {
    pub fn new(regime: TopologyRegime, n_line: usize, action_probability: f64) -> Self {
        Self {
            regime,
            n_line,
            action_probability: action_probability.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(0),
        }
    }

    fn in_distribution_lines(&self) -> std::ops::Range<usize> {
        0..self.n_line.div_ceil(2)
    }

    fn out_of_distribution_lines(&self) -> std::ops::Range<usize> {
        let start = self.n_line / 2;
        start..self.n_line
    }

    fn topology_change(&mut self) -> Action {
        match self.regime {
            TopologyRegime::InDistribution => {
                let line = self.rng.gen_range(self.in_distribution_lines());
                if self.rng.gen_bool(0.5) {
                    Action::disconnect_line(line)
                } else {
                    Action::set_bus(2 * line, 2)
                }
            }
            TopologyRegime::OutOfDistribution => {
                let seen = self.rng.gen_range(self.in_distribution_lines());
                let unseen = self.rng.gen_range(self.out_of_distribution_lines());
                Action::set_bus(2 * seen + 1, 2).combine(Action::set_bus(2 * unseen + 1, 2))
            }
        }
    }
}

impl Actor for RandomTopologyActor {
    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn act(&mut self, observation: &Observation) -> Action {
        if let Some(status) = observation.get("line_status") {
            if let Some(line) = status.iter().position(|s| *s < 0.5) {
                if self.rng.gen_bool(0.5) {
                    return Action::reconnect_line(line)
                        .combine(Action::set_bus(2 * line, 1))
                        .combine(Action::set_bus(2 * line + 1, 1));
                }
            }
        }
        if let Some(topo) = observation.get("topo_vect") {
            if let Some(position) = topo.iter().position(|bus| *bus > 1.5) {
                if self.rng.gen_bool(0.3) {
                    return Action::set_bus(position, 1);
                }
            }
        }
        if self.n_line > 0 && self.rng.gen_bool(self.action_probability) {
            self.topology_change()
        } else {
            Action::do_nothing()
        }
    }
}

/// [`ScenarioProvider`] for the synthetic backend.
#[derive(Debug, Clone, Default)]
pub struct SyntheticScenarioProvider {
    config: SyntheticGridConfig,
}

impl SyntheticScenarioProvider {
    pub fn new(config: SyntheticGridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SyntheticGridConfig {
        &self.config
    }

    fn actor(
        &self,
        simulator: &dyn PowerGridSimulator,
        regime: TopologyRegime,
    ) -> BenchResult<Box<dyn Actor>> {
        let n_line = simulator.metadata().n_line;
        if n_line == 0 {
            return Err(BenchError::SimulatorConstruction(format!(
                "simulator '{}' has no lines to act on",
                simulator.name()
            )));
        }
        Ok(Box::new(RandomTopologyActor::new(
            regime,
            n_line,
            self.config.actor_action_probability,
        )))
    }
}

impl ScenarioProvider for SyntheticScenarioProvider {
    fn simulator_parameters(&self) -> BenchResult<SimulatorParameters> {
        self.config.validate()?;
        Ok(SimulatorParameters {
            env_name: self.config.env_name.clone(),
            options: serde_json::to_value(&self.config)?,
        })
    }

    fn chronic_universe(&self, params: &SimulatorParameters) -> BenchResult<Vec<String>> {
        let config = SyntheticGridConfig::from_parameters(params)?;
        Ok(chronic_names(config.n_chronics))
    }

    fn build_simulator(
        &self,
        params: &SimulatorParameters,
        selector: &ChronicSelector,
        initial_chronics_id: usize,
    ) -> BenchResult<Box<dyn PowerGridSimulator>> {
        let config = SyntheticGridConfig::from_parameters(params)?;
        Ok(Box::new(SyntheticGridSimulator::new(
            config,
            selector,
            initial_chronics_id,
        )?))
    }

    fn build_training_actor(
        &self,
        simulator: &dyn PowerGridSimulator,
    ) -> BenchResult<Box<dyn Actor>> {
        self.actor(simulator, TopologyRegime::InDistribution)
    }

    fn build_test_actor(&self, simulator: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        self.actor(simulator, TopologyRegime::InDistribution)
    }

    fn build_ood_actor(&self, simulator: &dyn PowerGridSimulator) -> BenchResult<Box<dyn Actor>> {
        self.actor(simulator, TopologyRegime::OutOfDistribution)
    }
}
