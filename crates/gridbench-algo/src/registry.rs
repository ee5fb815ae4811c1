//! Name-indexed set of metrics run by the evaluation engine.

use gridbench_core::{BenchError, BenchResult};

use crate::conservation::{EnergyConservationMetric, ENERGY_CONSERVATION};
use crate::metrics::{ErrorKind, ErrorMetric, Metric};

/// Names accepted by [`MetricRegistry::from_names`], in default run order.
pub const BUILTIN_METRICS: [&str; 6] = ["mae", "mse", "rmse", "mape", "mape90", ENERGY_CONSERVATION];

/// Ordered collection of metrics. Registering a metric under an existing name
/// replaces the earlier one in place.
#[derive(Default)]
pub struct MetricRegistry {
    metrics: Vec<Box<dyn Metric>>,
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configured metric names.
    pub fn from_names(
        names: &[String],
        attributes: &[String],
        conservation_tolerance: f64,
    ) -> BenchResult<Self> {
        let mut registry = Self::new();
        for name in names {
            let metric: Box<dyn Metric> = if name == ENERGY_CONSERVATION {
                Box::new(EnergyConservationMetric::new(conservation_tolerance))
            } else if let Some(kind) = ErrorKind::parse(name) {
                Box::new(ErrorMetric::new(kind, attributes))
            } else {
                return Err(BenchError::Config(format!(
                    "unknown metric '{name}' (expected one of {})",
                    BUILTIN_METRICS.join(", ")
                )));
            };
            registry.register(metric);
        }
        Ok(registry)
    }

    /// Register a custom metric.
    pub fn register(&mut self, metric: Box<dyn Metric>) {
        match self.metrics.iter().position(|m| m.name() == metric.name()) {
            Some(idx) => self.metrics[idx] = metric,
            None => self.metrics.push(metric),
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Metric> {
        self.metrics
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Metric> {
        self.metrics.iter().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("metrics", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conservation::DEFAULT_TOLERANCE;
    use crate::metrics::MetricValue;
    use gridbench_core::SampleSet;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn defaults_cover_every_builtin() {
        let registry =
            MetricRegistry::from_names(&names(&BUILTIN_METRICS), &names(&["a_or"]), DEFAULT_TOLERANCE)
                .unwrap();
        assert_eq!(registry.names(), BUILTIN_METRICS.to_vec());
        assert!(registry.get(ENERGY_CONSERVATION).unwrap().requires_active_flow());
    }

    #[test]
    fn unknown_metric_is_a_config_error() {
        let err = MetricRegistry::from_names(&names(&["mae", "r2"]), &[], 1e-3).unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
        assert!(err.to_string().contains("r2"));
    }

    struct Constant;

    impl Metric for Constant {
        fn name(&self) -> &str {
            "mae"
        }

        fn compute(&self, _: &SampleSet, _: &SampleSet) -> BenchResult<MetricValue> {
            Ok(MetricValue::Scalar(42.0))
        }
    }

    #[test]
    fn register_replaces_by_name() {
        let mut registry = MetricRegistry::from_names(&names(&["mae", "mse"]), &[], 1e-3).unwrap();
        registry.register(Box::new(Constant));
        assert_eq!(registry.len(), 2);
        let value = registry
            .get("mae")
            .unwrap()
            .compute(&SampleSet::default(), &SampleSet::default())
            .unwrap();
        assert_eq!(value, MetricValue::Scalar(42.0));
    }
}
