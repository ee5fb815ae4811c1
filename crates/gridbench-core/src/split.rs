use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};

/// The four named sample collections of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitName {
    Train,
    Val,
    Test,
    TestOodTopo,
}

impl SplitName {
    /// Generation order: train, val, test, test_ood_topo.
    pub const ALL: [SplitName; 4] = [
        SplitName::Train,
        SplitName::Val,
        SplitName::Test,
        SplitName::TestOodTopo,
    ];

    /// Splits evaluated by the `"all"` selector. Training data is never evaluated.
    pub const EVALUATED: [SplitName; 3] = [SplitName::Val, SplitName::Test, SplitName::TestOodTopo];

    pub fn as_str(&self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Val => "val",
            SplitName::Test => "test",
            SplitName::TestOodTopo => "test_ood_topo",
        }
    }

    /// Resolve an evaluation selector into the ordered list of splits it names.
    ///
    /// Accepts `"all"`, each evaluated split name, and the `<name>_dataset`
    /// aliases. Matching is case-sensitive and `"train"` is rejected.
    pub fn parse_selector(selector: &str) -> BenchResult<Vec<SplitName>> {
        match selector {
            "all" => Ok(Self::EVALUATED.to_vec()),
            "val" | "val_dataset" => Ok(vec![SplitName::Val]),
            "test" | "test_dataset" => Ok(vec![SplitName::Test]),
            "test_ood_topo" | "test_ood_topo_dataset" => Ok(vec![SplitName::TestOodTopo]),
            other => Err(BenchError::UnknownDataset(other.to_string())),
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selects_evaluated_splits_in_order() {
        let splits = SplitName::parse_selector("all").unwrap();
        assert_eq!(
            splits,
            vec![SplitName::Val, SplitName::Test, SplitName::TestOodTopo]
        );
    }

    #[test]
    fn dataset_aliases_resolve() {
        assert_eq!(
            SplitName::parse_selector("test_dataset").unwrap(),
            vec![SplitName::Test]
        );
        assert_eq!(
            SplitName::parse_selector("test_ood_topo_dataset").unwrap(),
            vec![SplitName::TestOodTopo]
        );
    }

    #[test]
    fn selector_is_case_sensitive_and_excludes_train() {
        for bad in ["ALL", "Val", "train", "bogus", ""] {
            assert!(matches!(
                SplitName::parse_selector(bad),
                Err(BenchError::UnknownDataset(_))
            ));
        }
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&SplitName::TestOodTopo).unwrap();
        assert_eq!(json, "\"test_ood_topo\"");
    }
}
