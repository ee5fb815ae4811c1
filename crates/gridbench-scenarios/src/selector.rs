//! Deterministic partition of the chronic universe into the four splits.
//!
//! A chronic is identified by the textual form of its index (`"0042"`). Each split
//! owns one [`ChronicSelector`]: either "matches this pattern" or "does not match
//! this pattern". The default patterns look at the last three digits only: names
//! ending in `9xx` are held out and carved into `val` (`90x`-`94x`), `test`
//! (`95x`-`99x` ending in 0-4) and `test_ood_topo` (`95x`-`99x` ending in 5-9),
//! everything else is training data. Every universe is therefore partitioned
//! without overlap, whatever its size.

use gridbench_core::{BenchError, BenchResult, SplitName};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Serializable form of a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Regular expression searched for anywhere in the chronic name
    pub pattern: String,
    /// Select chronics that do NOT contain the pattern
    #[serde(default)]
    pub exclude: bool,
}

impl SelectorSpec {
    pub fn matching(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            exclude: false,
        }
    }

    pub fn excluding(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            exclude: true,
        }
    }

    pub fn compile(&self) -> BenchResult<ChronicSelector> {
        let regex = Regex::new(&self.pattern).map_err(|e| {
            BenchError::Config(format!("invalid chronic selector '{}': {e}", self.pattern))
        })?;
        Ok(if self.exclude {
            ChronicSelector::Excluding(regex)
        } else {
            ChronicSelector::Matching(regex)
        })
    }
}

/// Compiled predicate over chronic names.
#[derive(Debug, Clone)]
pub enum ChronicSelector {
    Matching(Regex),
    Excluding(Regex),
}

impl ChronicSelector {
    pub fn matches(&self, chronic: &str) -> bool {
        match self {
            ChronicSelector::Matching(re) => re.is_match(chronic),
            ChronicSelector::Excluding(re) => !re.is_match(chronic),
        }
    }

    /// Chronics of `universe` accepted by this selector, in universe order.
    pub fn select<'a>(&self, universe: &'a [String]) -> Vec<&'a str> {
        universe
            .iter()
            .map(String::as_str)
            .filter(|chronic| self.matches(chronic))
            .collect()
    }
}

/// The four selector specs of a benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSelectors {
    #[serde(default = "default_train")]
    pub train: SelectorSpec,
    #[serde(default = "default_val")]
    pub val: SelectorSpec,
    #[serde(default = "default_test")]
    pub test: SelectorSpec,
    #[serde(default = "default_test_ood_topo")]
    pub test_ood_topo: SelectorSpec,
}

fn default_train() -> SelectorSpec {
    SelectorSpec::excluding("9[0-9][0-9]$")
}

fn default_val() -> SelectorSpec {
    SelectorSpec::matching("9[0-4][0-9]$")
}

fn default_test() -> SelectorSpec {
    SelectorSpec::matching("9[5-9][0-4]$")
}

fn default_test_ood_topo() -> SelectorSpec {
    SelectorSpec::matching("9[5-9][5-9]$")
}

impl Default for SplitSelectors {
    fn default() -> Self {
        Self {
            train: default_train(),
            val: default_val(),
            test: default_test(),
            test_ood_topo: default_test_ood_topo(),
        }
    }
}

/// Chronic subsets per split after partitioning a universe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPartition {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
    pub test_ood_topo: Vec<String>,
}

impl SplitPartition {
    pub fn get(&self, split: SplitName) -> &[String] {
        match split {
            SplitName::Train => &self.train,
            SplitName::Val => &self.val,
            SplitName::Test => &self.test,
            SplitName::TestOodTopo => &self.test_ood_topo,
        }
    }

    /// Chronics not assigned to any split.
    pub fn excluded<'a>(&self, universe: &'a [String]) -> Vec<&'a str> {
        universe
            .iter()
            .filter(|c| SplitName::ALL.iter().all(|s| !self.get(*s).contains(c)))
            .map(String::as_str)
            .collect()
    }
}

impl SplitSelectors {
    pub fn spec(&self, split: SplitName) -> &SelectorSpec {
        match split {
            SplitName::Train => &self.train,
            SplitName::Val => &self.val,
            SplitName::Test => &self.test,
            SplitName::TestOodTopo => &self.test_ood_topo,
        }
    }

    pub fn compile(&self, split: SplitName) -> BenchResult<ChronicSelector> {
        self.spec(split).compile()
    }

    /// Partition `universe`, failing if any chronic is claimed by two splits.
    pub fn partition(&self, universe: &[String]) -> BenchResult<SplitPartition> {
        let compiled = SplitName::ALL
            .iter()
            .map(|split| Ok((*split, self.compile(*split)?)))
            .collect::<BenchResult<Vec<_>>>()?;

        let mut partition = SplitPartition::default();
        for chronic in universe {
            let owners: Vec<SplitName> = compiled
                .iter()
                .filter(|(_, selector)| selector.matches(chronic))
                .map(|(split, _)| *split)
                .collect();
            match owners.as_slice() {
                [] => {}
                [split] => {
                    let bucket = match split {
                        SplitName::Train => &mut partition.train,
                        SplitName::Val => &mut partition.val,
                        SplitName::Test => &mut partition.test,
                        SplitName::TestOodTopo => &mut partition.test_ood_topo,
                    };
                    bucket.push(chronic.clone());
                }
                many => {
                    let names: Vec<&str> = many.iter().map(SplitName::as_str).collect();
                    return Err(BenchError::Config(format!(
                        "chronic '{}' is selected by several splits: {}",
                        chronic,
                        names.join(", ")
                    )));
                }
            }
        }
        Ok(partition)
    }
}

/// Zero-padded textual chronic names `"0000"`, `"0001"`, ... for `count` chronics.
pub fn chronic_names(count: usize) -> Vec<String> {
    (0..count).map(|idx| format!("{idx:04}")).collect()
}
