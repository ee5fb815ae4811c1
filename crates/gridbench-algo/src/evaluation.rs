//! Evaluation of surrogate predictions against observations for one split.

use std::path::PathBuf;

use gridbench_core::{BenchResult, SampleSet};
use gridbench_io::write_report;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::conservation::DEFAULT_TOLERANCE;
use crate::metrics::MetricResults;
use crate::registry::{MetricRegistry, BUILTIN_METRICS};

/// `[eval]` section of a benchmark configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSettings {
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,
    /// Attributes compared by the error metrics; `None` means the target attributes
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
    #[serde(default = "default_tolerance")]
    pub conservation_tolerance: f64,
}

fn default_metrics() -> Vec<String> {
    BUILTIN_METRICS.iter().map(|m| m.to_string()).collect()
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            metrics: default_metrics(),
            attributes: None,
            conservation_tolerance: default_tolerance(),
        }
    }
}

/// Per-call evaluation options.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOptions {
    /// When false, metrics that read power flows are skipped
    pub active_flow: bool,
    /// Where to write the JSON report, if anywhere
    pub save_path: Option<PathBuf>,
    /// Entries added to the results as-is, before the report is written
    pub extra: MetricResults,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            active_flow: true,
            save_path: None,
            extra: MetricResults::new(),
        }
    }
}

/// Runs every registered metric over an `(observations, predictions)` pair.
#[derive(Debug, Default)]
pub struct EvaluationEngine {
    registry: MetricRegistry,
}

impl EvaluationEngine {
    pub fn new(registry: MetricRegistry) -> Self {
        Self { registry }
    }

    /// Build the engine from configuration, comparing `target_attributes` unless
    /// the settings name their own attribute list.
    pub fn from_settings(
        settings: &EvaluationSettings,
        target_attributes: &[String],
    ) -> BenchResult<Self> {
        let attributes = settings
            .attributes
            .as_deref()
            .unwrap_or(target_attributes);
        let registry = MetricRegistry::from_names(
            &settings.metrics,
            attributes,
            settings.conservation_tolerance,
        )?;
        Ok(Self::new(registry))
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Compute every applicable metric. Inputs are only read.
    ///
    /// A failure to write the report is logged and the in-memory results are
    /// still returned.
    pub fn evaluate(
        &self,
        observations: &SampleSet,
        predictions: &SampleSet,
        options: &EvaluationOptions,
    ) -> BenchResult<MetricResults> {
        let mut results = MetricResults::new();
        for metric in self.registry.iter() {
            if metric.requires_active_flow() && !options.active_flow {
                debug!(metric = metric.name(), "skipping flow metric (flows inactive)");
                continue;
            }
            let value = metric.compute(observations, predictions)?;
            results.insert(metric.name().to_string(), value);
        }
        results.extend(options.extra.clone());
        info!(
            samples = observations.len(),
            metrics = results.len(),
            "evaluation complete"
        );

        if let Some(path) = &options.save_path {
            match write_report(path, &results) {
                Ok(()) => info!(path = %path.display(), "wrote evaluation report"),
                Err(err) => error!(path = %path.display(), error = %err, "failed to write evaluation report"),
            }
        }
        Ok(results)
    }
}
