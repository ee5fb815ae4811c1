//! Metric capability and the built-in machine-learning error metrics.

use std::collections::BTreeMap;

use gridbench_core::{AttributeArray, BenchError, BenchResult, SampleSet};
use serde::{Deserialize, Serialize};

/// Observations smaller than this in magnitude are left out of percentage errors.
const MAPE_EPSILON: f64 = 1e-9;

/// Result of one metric: a scalar, a vector, an index list or a nested mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Scalar(f64),
    Indices(Vec<usize>),
    Array(Vec<f64>),
    Map(BTreeMap<String, MetricValue>),
}

impl MetricValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Nested lookup in a [`MetricValue::Map`].
    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        match self {
            MetricValue::Map(map) => map.get(key),
            _ => None,
        }
    }
}

/// Metric name to result, for one split.
pub type MetricResults = BTreeMap<String, MetricValue>;

/// Anything that compares predictions to observations.
pub trait Metric: Send + Sync {
    /// Registry key and report field name.
    fn name(&self) -> &str;

    /// Whether the metric reads power flows and is skipped when flows are inactive.
    fn requires_active_flow(&self) -> bool {
        false
    }

    fn compute(&self, observations: &SampleSet, predictions: &SampleSet)
        -> BenchResult<MetricValue>;
}

/// Kind of element-wise error aggregated by an [`ErrorMetric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Mae,
    Mse,
    Rmse,
    Mape,
    /// MAPE restricted to observations in the top decile of magnitude
    Mape90,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Mae,
        ErrorKind::Mse,
        ErrorKind::Rmse,
        ErrorKind::Mape,
        ErrorKind::Mape90,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Mae => "mae",
            ErrorKind::Mse => "mse",
            ErrorKind::Rmse => "rmse",
            ErrorKind::Mape => "mape",
            ErrorKind::Mape90 => "mape90",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    fn aggregate(&self, observed: &[f64], predicted: &[f64]) -> Option<f64> {
        match self {
            ErrorKind::Mae => mean(observed.iter().zip(predicted).map(|(o, p)| (p - o).abs())),
            ErrorKind::Mse => mean(observed.iter().zip(predicted).map(|(o, p)| (p - o).powi(2))),
            ErrorKind::Rmse => ErrorKind::Mse.aggregate(observed, predicted).map(f64::sqrt),
            ErrorKind::Mape => mape(observed, predicted, 0.0),
            ErrorKind::Mape90 => {
                let threshold = quantile(observed.iter().map(|o| o.abs()).collect(), 0.9)?;
                mape(observed, predicted, threshold)
            }
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean absolute percentage error over observations with `|o| >= threshold`.
fn mape(observed: &[f64], predicted: &[f64], threshold: f64) -> Option<f64> {
    mean(
        observed
            .iter()
            .zip(predicted)
            .filter(|(o, _)| o.abs() > MAPE_EPSILON && o.abs() >= threshold)
            .map(|(o, p)| (p - o).abs() / o.abs()),
    )
}

/// Linear-interpolation quantile, `q` in `[0, 1]`.
fn quantile(mut values: Vec<f64>, q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let position = q * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(values[lower] + (values[upper] - values[lower]) * weight)
}

/// Per-attribute error metric over a fixed list of target attributes.
#[derive(Debug, Clone)]
pub struct ErrorMetric {
    kind: ErrorKind,
    attributes: Vec<String>,
}

impl ErrorMetric {
    pub fn new(kind: ErrorKind, attributes: &[String]) -> Self {
        Self {
            kind,
            attributes: attributes.to_vec(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn pair<'a>(
        &self,
        name: &str,
        observations: &'a SampleSet,
        predictions: &'a SampleSet,
    ) -> BenchResult<(&'a AttributeArray, &'a AttributeArray)> {
        let observed = observations.get(name).ok_or_else(|| {
            BenchError::Validation(format!("observations have no attribute '{name}'"))
        })?;
        let predicted = predictions.get(name).ok_or_else(|| {
            BenchError::Validation(format!("predictions have no attribute '{name}'"))
        })?;
        if observed.rows() != predicted.rows() || observed.cols() != predicted.cols() {
            return Err(BenchError::Validation(format!(
                "'{name}': predictions are {}x{} but observations are {}x{}",
                predicted.rows(),
                predicted.cols(),
                observed.rows(),
                observed.cols()
            )));
        }
        Ok((observed, predicted))
    }
}

impl Metric for ErrorMetric {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn compute(
        &self,
        observations: &SampleSet,
        predictions: &SampleSet,
    ) -> BenchResult<MetricValue> {
        let mut per_attribute = BTreeMap::new();
        for name in &self.attributes {
            let (observed, predicted) = self.pair(name, observations, predictions)?;
            let value = self
                .kind
                .aggregate(observed.as_slice(), predicted.as_slice())
                .ok_or_else(|| {
                    BenchError::Validation(format!(
                        "{}: no values to compare for '{name}'",
                        self.kind.as_str()
                    ))
                })?;
            per_attribute.insert(name.clone(), MetricValue::Scalar(value));
        }
        Ok(MetricValue::Map(per_attribute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: &str, rows: &[Vec<f64>]) -> SampleSet {
        let mut set = SampleSet::default();
        set.insert(name, AttributeArray::from_rows(rows).unwrap());
        set
    }

    fn scalar(kind: ErrorKind, obs: &SampleSet, pred: &SampleSet) -> f64 {
        ErrorMetric::new(kind, &["a_or".to_string()])
            .compute(obs, pred)
            .unwrap()
            .get("a_or")
            .and_then(MetricValue::as_scalar)
            .unwrap()
    }

    #[test]
    fn error_metrics_on_known_values() {
        let obs = set("a_or", &[vec![1.0, 2.0], vec![4.0, 8.0]]);
        let pred = set("a_or", &[vec![2.0, 2.0], vec![2.0, 8.0]]);
        assert_eq!(scalar(ErrorKind::Mae, &obs, &pred), 0.75);
        assert_eq!(scalar(ErrorKind::Mse, &obs, &pred), 1.25);
        assert!((scalar(ErrorKind::Rmse, &obs, &pred) - 1.25_f64.sqrt()).abs() < 1e-12);
        assert_eq!(scalar(ErrorKind::Mape, &obs, &pred), 0.375);
    }

    #[test]
    fn mape_skips_zero_observations() {
        let obs = set("a_or", &[vec![0.0, 2.0]]);
        let pred = set("a_or", &[vec![5.0, 3.0]]);
        assert_eq!(scalar(ErrorKind::Mape, &obs, &pred), 0.5);
    }

    #[test]
    fn mape90_uses_largest_observations() {
        let observed: Vec<f64> = (1..=10).map(f64::from).collect();
        let mut predicted = observed.clone();
        predicted[0] = 100.0;
        predicted[9] = 11.0;
        let obs = set("a_or", &[observed]);
        let pred = set("a_or", &[predicted]);
        assert!((scalar(ErrorKind::Mape90, &obs, &pred) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let obs = set("a_or", &[vec![1.0, 2.0]]);
        let pred = set("a_or", &[vec![1.0]]);
        let err = ErrorMetric::new(ErrorKind::Mae, &["a_or".to_string()])
            .compute(&obs, &pred)
            .unwrap_err();
        assert!(matches!(err, BenchError::Validation(_)));
    }

    #[test]
    fn missing_prediction_is_an_error() {
        let obs = set("a_or", &[vec![1.0]]);
        let err = ErrorMetric::new(ErrorKind::Mse, &["a_or".to_string()])
            .compute(&obs, &SampleSet::default())
            .unwrap_err();
        assert!(err.to_string().contains("predictions"));
    }

    #[test]
    fn kinds_parse_from_names() {
        assert_eq!(ErrorKind::parse("mape90"), Some(ErrorKind::Mape90));
        assert_eq!(ErrorKind::parse("MAE"), None);
    }

    #[test]
    fn untagged_values_serialize_plainly() {
        let mut map = BTreeMap::new();
        map.insert("x".to_string(), MetricValue::Scalar(1.5));
        map.insert("i".to_string(), MetricValue::Indices(vec![0, 2]));
        let json = serde_json::to_string(&MetricValue::Map(map)).unwrap();
        assert_eq!(json, r#"{"i":[0,2],"x":1.5}"#);
    }
}
