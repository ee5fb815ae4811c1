//! Evaluation algorithms for gridbench.
//!
//! - [`ConservationLawChecker`]: per-observation energy balance check
//! - [`Metric`]: capability implemented by every metric, plus the built-in
//!   error metrics (MAE, MSE, RMSE, MAPE, MAPE90)
//! - [`MetricRegistry`]: configuration-driven metric set
//! - [`EvaluationEngine`]: runs a registry over one split and optionally writes a report

pub mod conservation;
pub mod evaluation;
pub mod metrics;
pub mod registry;

pub use conservation::{
    check_energy_conservation, ConservationLawChecker, ConservationReport,
    EnergyConservationMetric, DEFAULT_TOLERANCE, ENERGY_CONSERVATION,
};
pub use evaluation::{EvaluationEngine, EvaluationOptions, EvaluationSettings};
pub use metrics::{ErrorKind, ErrorMetric, Metric, MetricResults, MetricValue};
pub use registry::{MetricRegistry, BUILTIN_METRICS};
