//! Named sample collections and the generation loop that fills them.

use std::path::Path;

use gridbench_core::{AttributeGroups, BenchError, BenchResult, SampleSet, SplitName};
use gridbench_io::{read_split, write_split};
use gridbench_scenarios::{Actor, PowerGridSimulator, StepOutcome};
use tracing::{debug, info};

/// One split of a benchmark. Population is all-or-nothing: `generate` and `load`
/// either replace the whole content or leave the split untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplit {
    name: SplitName,
    groups: AttributeGroups,
    attribute_names: Vec<String>,
    data: SampleSet,
    populated: bool,
}

impl DatasetSplit {
    pub fn new(name: SplitName, groups: AttributeGroups) -> Self {
        let attribute_names = groups.all();
        Self {
            name,
            data: SampleSet::new(&attribute_names),
            attribute_names,
            groups,
            populated: false,
        }
    }

    /// Populated split built from in-memory samples. `data` must hold every
    /// attribute of `groups`; extra attributes are dropped.
    pub fn with_data(name: SplitName, groups: AttributeGroups, data: SampleSet) -> BenchResult<Self> {
        let mut split = Self::new(name, groups);
        let data = data.select(&split.attribute_names)?;
        data.check_consistent(name.as_str())?;
        split.data = data;
        split.populated = true;
        Ok(split)
    }

    pub fn name(&self) -> SplitName {
        self.name
    }

    pub fn groups(&self) -> &AttributeGroups {
        &self.groups
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn data(&self) -> &SampleSet {
        &self.data
    }

    /// Whether the split was filled by `generate` or `load`.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Surrogate inputs: `attr_x ++ attr_tau`.
    pub fn inputs(&self) -> BenchResult<SampleSet> {
        self.data.select(&self.groups.inputs())
    }

    /// Ground-truth targets: `attr_y`.
    pub fn targets(&self) -> BenchResult<SampleSet> {
        self.data.select(&self.groups.attr_y)
    }

    /// Step `simulator` under `actor` until `n_samples` steps are accepted, then
    /// persist the split under `path_out`.
    ///
    /// Rejected steps are skipped. After `max_consecutive_rejections` rejections
    /// in a row the run fails with [`BenchError::GenerationStalled`].
    pub fn generate(
        &mut self,
        simulator: &mut dyn PowerGridSimulator,
        actor: &mut dyn Actor,
        path_out: &Path,
        n_samples: usize,
        max_consecutive_rejections: usize,
    ) -> BenchResult<()> {
        let split = self.name.as_str();
        let mut samples = SampleSet::new(&self.attribute_names);
        let mut consecutive = 0usize;
        let mut rejected = 0usize;

        while samples.len() < n_samples {
            let action = actor.act(simulator.observation());
            match simulator.step(&action) {
                StepOutcome::Accepted(observation) => {
                    samples.push_observation(&observation)?;
                    consecutive = 0;
                }
                StepOutcome::Rejected { reason } => {
                    consecutive += 1;
                    rejected += 1;
                    debug!(split, %reason, consecutive, "step rejected");
                    if consecutive >= max_consecutive_rejections {
                        return Err(BenchError::GenerationStalled {
                            split: split.to_string(),
                            collected: samples.len(),
                            requested: n_samples,
                            rejections: consecutive,
                        });
                    }
                }
            }
        }

        write_split(path_out, split, &samples)?;
        info!(
            split,
            samples = samples.len(),
            rejected,
            simulator = simulator.name(),
            "generated split"
        );
        self.data = samples;
        self.populated = true;
        Ok(())
    }

    /// Replace the content with the persisted copy under `path`.
    pub fn load(&mut self, path: &Path) -> BenchResult<()> {
        let data = read_split(path, self.name.as_str(), &self.attribute_names)?;
        info!(split = self.name.as_str(), samples = data.len(), "loaded split");
        self.data = data;
        self.populated = true;
        Ok(())
    }
}
