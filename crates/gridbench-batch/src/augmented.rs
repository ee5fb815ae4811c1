//! Surrogate ("augmented simulator") capability and reference baselines.

use gridbench_core::{AttributeArray, BenchError, BenchResult, SampleSet};
use gridbench_scenarios::PowerGridSimulator;

use crate::dataset::DatasetSplit;

/// A model predicting simulator outputs from a split's inputs.
///
/// `evaluate` must return one array per target attribute, with one row per
/// sample of `dataset`. Models that do not batch ignore `batch_size`.
pub trait AugmentedSimulator {
    fn name(&self) -> &str;

    /// Called with the training simulator before each split is evaluated, for
    /// models that read grid metadata.
    fn prepare(&mut self, _simulator: &dyn PowerGridSimulator) -> BenchResult<()> {
        Ok(())
    }

    fn evaluate(&mut self, dataset: &DatasetSplit, batch_size: usize) -> BenchResult<SampleSet>;
}

/// Predicts the per-element mean of each target, as fitted on a reference split.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanBaseline {
    means: Vec<(String, Vec<f64>)>,
}

impl MeanBaseline {
    /// Fit on the targets of `reference`, usually the training split.
    pub fn fit(reference: &DatasetSplit) -> BenchResult<Self> {
        if reference.is_empty() {
            return Err(BenchError::Validation(format!(
                "cannot fit a mean baseline on empty split '{}'",
                reference.name()
            )));
        }
        let targets = reference.targets()?;
        let means = targets
            .iter()
            .map(|(name, array)| {
                let rows = array.rows() as f64;
                let means = (0..array.cols())
                    .map(|col| array.iter_rows().map(|row| row[col]).sum::<f64>() / rows)
                    .collect();
                (name.to_string(), means)
            })
            .collect();
        Ok(Self { means })
    }

    pub fn means(&self, attribute: &str) -> Option<&[f64]> {
        self.means
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, means)| means.as_slice())
    }
}

impl AugmentedSimulator for MeanBaseline {
    fn name(&self) -> &str {
        "mean_baseline"
    }

    fn evaluate(&mut self, dataset: &DatasetSplit, batch_size: usize) -> BenchResult<SampleSet> {
        if batch_size == 0 {
            return Err(BenchError::Validation("batch_size must be at least 1".to_string()));
        }
        let mut predictions = SampleSet::default();
        for (name, _) in &self.means {
            predictions.insert(name.clone(), AttributeArray::empty());
        }
        let mut start = 0;
        while start < dataset.len() {
            let batch = batch_size.min(dataset.len() - start);
            let mut chunk = SampleSet::default();
            for (name, means) in &self.means {
                let data = means.iter().copied().cycle().take(batch * means.len()).collect();
                chunk.insert(name.clone(), AttributeArray::from_flat(batch, means.len(), data)?);
            }
            predictions.extend(&chunk)?;
            start += batch;
        }
        Ok(predictions)
    }
}

/// Replays the ground-truth targets; a physics-exact reference that ignores batching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationReplay;

impl AugmentedSimulator for ObservationReplay {
    fn name(&self) -> &str {
        "observation_replay"
    }

    fn evaluate(&mut self, dataset: &DatasetSplit, _batch_size: usize) -> BenchResult<SampleSet> {
        dataset.targets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridbench_core::{AttributeGroups, SplitName};

    fn split(values: &[[f64; 2]]) -> DatasetSplit {
        let groups = AttributeGroups::new(Vec::new(), Vec::new(), vec!["p_or".into()]);
        let rows: Vec<Vec<f64>> = values.iter().map(|r| r.to_vec()).collect();
        let mut data = SampleSet::default();
        data.insert("p_or", AttributeArray::from_rows(&rows).unwrap());
        DatasetSplit::with_data(SplitName::Train, groups, data).unwrap()
    }

    #[test]
    fn mean_baseline_predicts_column_means_in_batches() {
        let train = split(&[[1.0, 10.0], [3.0, 20.0]]);
        let mut baseline = MeanBaseline::fit(&train).unwrap();
        assert_eq!(baseline.means("p_or"), Some(&[2.0, 15.0][..]));

        let target = split(&[[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]);
        let predictions = baseline.evaluate(&target, 2).unwrap();
        let p_or = predictions.get("p_or").unwrap();
        assert_eq!(p_or.rows(), 3);
        assert_eq!(p_or.row(2), Some(&[2.0, 15.0][..]));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let train = split(&[[1.0, 1.0]]);
        let mut baseline = MeanBaseline::fit(&train).unwrap();
        assert!(baseline.evaluate(&train, 0).is_err());
    }

    #[test]
    fn empty_reference_cannot_be_fitted() {
        let groups = AttributeGroups::new(Vec::new(), Vec::new(), vec!["p_or".into()]);
        let empty = DatasetSplit::new(SplitName::Train, groups);
        assert!(matches!(
            MeanBaseline::fit(&empty),
            Err(BenchError::Validation(_))
        ));
    }

    #[test]
    fn replay_returns_targets() {
        let data = split(&[[1.0, 2.0]]);
        let predictions = ObservationReplay.evaluate(&data, 999).unwrap();
        assert_eq!(predictions, data.targets().unwrap());
    }
}
