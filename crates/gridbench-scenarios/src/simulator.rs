//! Capabilities consumed from the physical simulator backend and its actors.

use gridbench_core::Observation;
use serde::{Deserialize, Serialize};

/// Topology action applied by an [`Actor`] before a simulator step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// `(line index, connected)` pairs
    #[serde(default)]
    pub set_line_status: Vec<(usize, bool)>,
    /// `(topo_vect position, bus)` pairs; buses are numbered 1 and 2
    #[serde(default)]
    pub set_bus: Vec<(usize, u8)>,
}

impl Action {
    pub fn do_nothing() -> Self {
        Self::default()
    }

    pub fn is_do_nothing(&self) -> bool {
        self.set_line_status.is_empty() && self.set_bus.is_empty()
    }

    pub fn disconnect_line(line: usize) -> Self {
        Self {
            set_line_status: vec![(line, false)],
            set_bus: Vec::new(),
        }
    }

    pub fn reconnect_line(line: usize) -> Self {
        Self {
            set_line_status: vec![(line, true)],
            set_bus: Vec::new(),
        }
    }

    pub fn set_bus(position: usize, bus: u8) -> Self {
        Self {
            set_line_status: Vec::new(),
            set_bus: vec![(position, bus)],
        }
    }

    /// Union of two actions; entries of `other` are applied after `self`.
    pub fn combine(mut self, other: Action) -> Self {
        self.set_line_status.extend(other.set_line_status);
        self.set_bus.extend(other.set_bus);
        self
    }
}

/// Result of stepping the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A valid post-step state
    Accepted(Observation),
    /// The step diverged or violated an operating limit; no sample is produced
    Rejected { reason: String },
}

/// Static description of the simulated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMetadata {
    pub n_gen: usize,
    pub n_load: usize,
    pub n_line: usize,
    /// Length of `topo_vect` (two ends per line)
    pub dim_topo: usize,
}

/// Ground-truth power-flow simulator over a subset of recorded chronics.
pub trait PowerGridSimulator {
    fn name(&self) -> &str;

    /// Reseed simulator-internal randomness and restart from the initial chronic.
    fn seed(&mut self, seed: u64);

    fn metadata(&self) -> GridMetadata;

    /// Chronics this instance replays, in replay order.
    fn chronics(&self) -> &[String];

    /// State after the most recent accepted step (or after reset).
    fn observation(&self) -> &Observation;

    fn step(&mut self, action: &Action) -> StepOutcome;
}

/// Policy choosing the actions applied during dataset generation.
pub trait Actor {
    /// Reseed action-selection randomness, independent of the simulator seed.
    fn seed(&mut self, seed: u64);

    fn act(&mut self, observation: &Observation) -> Action;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_keeps_both_changes() {
        let action = Action::disconnect_line(2).combine(Action::set_bus(5, 2));
        assert_eq!(action.set_line_status, vec![(2, false)]);
        assert_eq!(action.set_bus, vec![(5, 2)]);
        assert!(!action.is_do_nothing());
        assert!(Action::do_nothing().is_do_nothing());
    }
}
