//! # gridbench-core: shared types for power-grid surrogate benchmarking
//!
//! Every other crate of the workspace speaks in the types defined here:
//!
//! - [`SplitName`] - the four dataset splits (`train`, `val`, `test`, `test_ood_topo`)
//! - [`AttributeGroups`] - input, topology and target attribute name lists
//! - [`Observation`] - one accepted simulator state keyed by attribute name
//! - [`SampleSet`] / [`AttributeArray`] - per-attribute `n_samples x n_elements` blocks
//! - [`BenchError`] / [`BenchResult`] - the unified error taxonomy
//!
//! Attribute names follow the usual power-flow observation vocabulary:
//! `prod_p` (generator active power), `load_p`, `p_or`/`p_ex` (active power at the
//! origin/extremity end of each line), `a_or` (current), `v_or` (voltage),
//! `line_status` and `topo_vect` (topology).

pub mod attributes;
pub mod error;
pub mod sample;
pub mod split;

pub use attributes::AttributeGroups;
pub use error::{BenchError, BenchResult};
pub use sample::{AttributeArray, Observation, SampleSet};
pub use split::SplitName;
