use serde::{Deserialize, Serialize};

/// The three semantic attribute groups a benchmark records.
///
/// `attr_x` are exogenous inputs (productions, loads), `attr_tau` are topology and
/// control attributes, `attr_y` are the targets a surrogate has to predict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroups {
    pub attr_x: Vec<String>,
    pub attr_tau: Vec<String>,
    pub attr_y: Vec<String>,
}

impl AttributeGroups {
    pub fn new(attr_x: Vec<String>, attr_tau: Vec<String>, attr_y: Vec<String>) -> Self {
        Self {
            attr_x,
            attr_tau,
            attr_y,
        }
    }

    /// Concatenation `attr_x ++ attr_tau ++ attr_y`, the attribute list of every split.
    pub fn all(&self) -> Vec<String> {
        self.attr_x
            .iter()
            .chain(&self.attr_tau)
            .chain(&self.attr_y)
            .cloned()
            .collect()
    }

    /// Inputs handed to a surrogate: `attr_x ++ attr_tau`.
    pub fn inputs(&self) -> Vec<String> {
        self.attr_x.iter().chain(&self.attr_tau).cloned().collect()
    }
}

impl Default for AttributeGroups {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            attr_x: owned(&["prod_p", "prod_v", "load_p", "load_q"]),
            attr_tau: owned(&["line_status", "topo_vect"]),
            attr_y: owned(&["a_or", "a_ex", "p_or", "p_ex", "v_or", "v_ex"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_concatenates_groups_in_order() {
        let groups = AttributeGroups::new(
            vec!["x".into()],
            vec!["tau".into()],
            vec!["y1".into(), "y2".into()],
        );
        assert_eq!(groups.all(), vec!["x", "tau", "y1", "y2"]);
        assert_eq!(groups.inputs(), vec!["x", "tau"]);
    }
}
