//! Energy conservation check: production = load + transmission losses.
//!
//! For every observation the checker sums production, load and the signed line
//! flows at both ends (`p_or + p_ex`, whose sum is the line loss) and reports
//!
//! ```text
//! deviation = sum(prod_p) - sum(load_p) - sum(p_or + p_ex)
//! ```
//!
//! An observation fails when `|deviation| > tolerance`. A NaN deviation always fails.

use std::collections::BTreeMap;

use gridbench_core::{AttributeArray, BenchError, BenchResult, SampleSet};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::metrics::{Metric, MetricValue};

pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Name under which the check is registered as a metric.
pub const ENERGY_CONSERVATION: &str = "energy_conservation";

/// Outcome of a conservation check over a batch of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationReport {
    /// One deviation per observation, in observation order
    pub deviations: Vec<f64>,
    /// `100 * failed / n_observations`
    pub violation_percentage: f64,
    /// Ascending indices of the failing observations
    pub failed_indices: Vec<usize>,
    pub tolerance: f64,
}

impl ConservationReport {
    pub fn n_observations(&self) -> usize {
        self.deviations.len()
    }

    pub fn max_abs_deviation(&self) -> f64 {
        self.deviations.iter().fold(0.0_f64, |acc, d| acc.max(d.abs()))
    }

    pub fn to_metric_value(&self) -> MetricValue {
        let mut map = BTreeMap::new();
        map.insert(
            "deviations".to_string(),
            MetricValue::Array(self.deviations.clone()),
        );
        map.insert(
            "violation_percentage".to_string(),
            MetricValue::Scalar(self.violation_percentage),
        );
        map.insert(
            "failed_indices".to_string(),
            MetricValue::Indices(self.failed_indices.clone()),
        );
        MetricValue::Map(map)
    }
}

/// Checks the conservation law at a fixed tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationLawChecker {
    tolerance: f64,
}

impl Default for ConservationLawChecker {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl ConservationLawChecker {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Run the check over `n_observations x n_elements` batches.
    ///
    /// The four batches must have the same number of observations, and that
    /// number must be positive.
    pub fn check(
        &self,
        prod_p: &AttributeArray,
        load_p: &AttributeArray,
        p_or: &AttributeArray,
        p_ex: &AttributeArray,
    ) -> BenchResult<ConservationReport> {
        let n = prod_p.rows();
        let batches = [("load_p", load_p), ("p_or", p_or), ("p_ex", p_ex)];
        for (name, batch) in batches {
            if batch.rows() != n {
                return Err(BenchError::Validation(format!(
                    "{name} has {} observations but prod_p has {n}",
                    batch.rows()
                )));
            }
        }
        if n == 0 {
            return Err(BenchError::Validation(
                "conservation check needs at least one observation".to_string(),
            ));
        }

        let production = prod_p.row_sums();
        let load = load_p.row_sums();
        let losses: Vec<f64> = p_or
            .row_sums()
            .iter()
            .zip(p_ex.row_sums())
            .map(|(or, ex)| or + ex)
            .collect();

        let deviations: Vec<f64> = production
            .iter()
            .zip(&load)
            .zip(&losses)
            .map(|((prod, load), loss)| prod - load - loss)
            .collect();
        let failed_indices: Vec<usize> = deviations
            .iter()
            .enumerate()
            .filter(|(_, d)| !(d.abs() <= self.tolerance))
            .map(|(idx, _)| idx)
            .collect();
        let violation_percentage = 100.0 * failed_indices.len() as f64 / n as f64;

        info!(
            observations = n,
            failed = failed_indices.len(),
            violation_percentage,
            tolerance = self.tolerance,
            "energy conservation check"
        );

        Ok(ConservationReport {
            deviations,
            violation_percentage,
            failed_indices,
            tolerance: self.tolerance,
        })
    }
}

/// Free-function form of [`ConservationLawChecker::check`].
pub fn check_energy_conservation(
    prod_p: &AttributeArray,
    load_p: &AttributeArray,
    p_or: &AttributeArray,
    p_ex: &AttributeArray,
    tolerance: f64,
) -> BenchResult<ConservationReport> {
    ConservationLawChecker::new(tolerance).check(prod_p, load_p, p_or, p_ex)
}

/// The conservation check as a registered metric. Each of the four quantities is
/// taken from the predictions when the surrogate produced it, otherwise from the
/// observations.
#[derive(Debug, Clone, Default)]
pub struct EnergyConservationMetric {
    checker: ConservationLawChecker,
}

impl EnergyConservationMetric {
    pub fn new(tolerance: f64) -> Self {
        Self {
            checker: ConservationLawChecker::new(tolerance),
        }
    }
}

fn predicted_or_observed<'a>(
    name: &str,
    observations: &'a SampleSet,
    predictions: &'a SampleSet,
) -> BenchResult<&'a AttributeArray> {
    predictions
        .get(name)
        .or_else(|| observations.get(name))
        .ok_or_else(|| {
            BenchError::Validation(format!(
                "{ENERGY_CONSERVATION} needs '{name}' in predictions or observations"
            ))
        })
}

impl Metric for EnergyConservationMetric {
    fn name(&self) -> &str {
        ENERGY_CONSERVATION
    }

    fn requires_active_flow(&self) -> bool {
        true
    }

    fn compute(
        &self,
        observations: &SampleSet,
        predictions: &SampleSet,
    ) -> BenchResult<MetricValue> {
        let report = self.checker.check(
            predicted_or_observed("prod_p", observations, predictions)?,
            predicted_or_observed("load_p", observations, predictions)?,
            predicted_or_observed("p_or", observations, predictions)?,
            predicted_or_observed("p_ex", observations, predictions)?,
        )?;
        Ok(report.to_metric_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(value: f64) -> AttributeArray {
        AttributeArray::from_rows(&[vec![value]]).unwrap()
    }

    #[test]
    fn balanced_observation_passes() {
        let report = check_energy_conservation(
            &single(10.0),
            &single(4.0),
            &single(3.0),
            &single(3.0),
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(report.deviations, vec![0.0]);
        assert_eq!(report.violation_percentage, 0.0);
        assert!(report.failed_indices.is_empty());
    }

    #[test]
    fn unbalanced_observation_fails() {
        let report = check_energy_conservation(
            &single(10.0),
            &single(4.0),
            &single(1.0),
            &single(1.0),
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(report.deviations, vec![4.0]);
        assert_eq!(report.violation_percentage, 100.0);
        assert_eq!(report.failed_indices, vec![0]);
    }

    #[test]
    fn partial_violations_are_indexed() {
        let rows = |values: &[&[f64]]| {
            AttributeArray::from_rows(&values.iter().map(|r| r.to_vec()).collect::<Vec<_>>())
                .unwrap()
        };
        let prod = rows(&[&[5.0, 5.0], &[10.0, 0.0], &[3.0, 0.0], &[1.0, 1.0]]);
        let load = rows(&[&[9.0], &[10.0], &[3.0], &[2.0]]);
        let p_or = rows(&[&[0.5, 0.6], &[0.0, 0.0], &[0.1, 0.0], &[0.0, 0.0]]);
        let p_ex = rows(&[&[-0.05, -0.05], &[0.0, 0.0], &[0.0, 0.0], &[0.0005, 0.0]]);
        let report = ConservationLawChecker::default()
            .check(&prod, &load, &p_or, &p_ex)
            .unwrap();
        assert_eq!(report.n_observations(), 4);
        assert_eq!(report.failed_indices, vec![2]);
        assert_eq!(report.violation_percentage, 25.0);
        assert!((report.deviations[0]).abs() < 1e-12);
        assert!((report.max_abs_deviation() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn nan_deviation_counts_as_violation() {
        let report = check_energy_conservation(
            &single(f64::NAN),
            &single(4.0),
            &single(3.0),
            &single(3.0),
            DEFAULT_TOLERANCE,
        )
        .unwrap();
        assert_eq!(report.failed_indices, vec![0]);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let empty = AttributeArray::empty();
        let err = check_energy_conservation(&empty, &empty, &empty, &empty, DEFAULT_TOLERANCE)
            .unwrap_err();
        assert!(matches!(err, BenchError::Validation(_)));
    }

    #[test]
    fn mismatched_batches_are_rejected() {
        let two = AttributeArray::from_rows(&[vec![1.0], vec![1.0]]).unwrap();
        let err = check_energy_conservation(&two, &single(1.0), &two, &two, DEFAULT_TOLERANCE)
            .unwrap_err();
        assert!(err.to_string().contains("load_p"));
    }

    #[test]
    fn metric_prefers_predicted_flows() {
        let mut observations = SampleSet::default();
        observations.insert("prod_p", single(10.0));
        observations.insert("load_p", single(4.0));
        observations.insert("p_or", single(3.0));
        observations.insert("p_ex", single(3.0));
        let mut predictions = SampleSet::default();
        predictions.insert("p_or", single(1.0));
        predictions.insert("p_ex", single(1.0));

        let value = EnergyConservationMetric::default()
            .compute(&observations, &predictions)
            .unwrap();
        let MetricValue::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["failed_indices"], MetricValue::Indices(vec![0]));
        assert_eq!(map["violation_percentage"], MetricValue::Scalar(100.0));
    }
}
