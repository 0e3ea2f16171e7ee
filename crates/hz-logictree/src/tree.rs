//! Logic tree definitions and structural validation.

use std::collections::HashSet;

use hz_core::{SourceId, weights_sum_to_one};
use serde::{Deserialize, Serialize};

use crate::error::{LogicTreeError, LogicTreeResult};

/// Epistemic choice carried by a branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Uncertainty {
    /// Selects one of the named source models of the calculation.
    SourceModel { name: String },
    /// Adds `delta` to the maximum magnitude of Gutenberg-Richter MFDs.
    MaxMagRelative { delta: f64 },
    /// Adds `delta` to the b value of Gutenberg-Richter MFDs.
    BValueRelative { delta: f64 },
    /// Replaces the a and b values of Gutenberg-Richter MFDs.
    AbsoluteGutenbergRichter { a_val: f64, b_val: f64 },
    /// Assigns a ground-motion model to every source of a tectonic region.
    GroundMotionModel {
        tectonic_region: String,
        model: String,
    },
}

/// Discriminant of [`Uncertainty`]; all branches of a set share one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertaintyKind {
    SourceModel,
    MaxMagRelative,
    BValueRelative,
    AbsoluteGutenbergRichter,
    GroundMotionModel,
}

impl Uncertainty {
    pub fn kind(&self) -> UncertaintyKind {
        match self {
            Uncertainty::SourceModel { .. } => UncertaintyKind::SourceModel,
            Uncertainty::MaxMagRelative { .. } => UncertaintyKind::MaxMagRelative,
            Uncertainty::BValueRelative { .. } => UncertaintyKind::BValueRelative,
            Uncertainty::AbsoluteGutenbergRichter { .. } => {
                UncertaintyKind::AbsoluteGutenbergRichter
            }
            Uncertainty::GroundMotionModel { .. } => UncertaintyKind::GroundMotionModel,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub id: String,
    pub weight: f64,
    pub uncertainty: Uncertainty,
    /// Sources the uncertainty applies to; empty means every source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apply_to_sources: Vec<SourceId>,
}

impl Branch {
    pub fn applies_to(&self, source_id: &str) -> bool {
        self.apply_to_sources.is_empty() || self.apply_to_sources.iter().any(|s| s == source_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BranchSet {
    pub id: String,
    pub branches: Vec<Branch>,
}

impl BranchSet {
    pub fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.branches.iter().map(|b| b.weight)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LogicTree {
    #[serde(default)]
    pub branch_sets: Vec<BranchSet>,
}

impl LogicTree {
    pub fn new(branch_sets: Vec<BranchSet>) -> Self {
        Self { branch_sets }
    }

    /// Number of distinct end branches (paths through the tree).
    pub fn path_count(&self) -> usize {
        self.branch_sets
            .iter()
            .map(|bs| bs.branches.len())
            .product()
    }

    /// Check weights, leaves and uncertainty placement.
    pub fn validate(&self) -> LogicTreeResult<()> {
        if self.branch_sets.is_empty() {
            return Err(LogicTreeError::NoLeaves {
                what: "tree has no branch sets".to_string(),
            });
        }

        let mut ids = HashSet::new();
        for (level, set) in self.branch_sets.iter().enumerate() {
            let first = set.branches.first().ok_or_else(|| LogicTreeError::NoLeaves {
                what: format!("branch set {} has no branches", set.id),
            })?;

            let kind = first.uncertainty.kind();
            if kind == UncertaintyKind::SourceModel && level != 0 {
                return Err(LogicTreeError::MisplacedSourceModel {
                    branch_set: set.id.clone(),
                });
            }

            for branch in &set.branches {
                if !ids.insert(branch.id.as_str()) {
                    return Err(LogicTreeError::DuplicateBranch {
                        id: branch.id.clone(),
                    });
                }
                if !branch.weight.is_finite() || branch.weight < 0.0 || branch.weight > 1.0 {
                    return Err(LogicTreeError::InvalidWeight {
                        branch: branch.id.clone(),
                        weight: branch.weight,
                    });
                }
                if branch.uncertainty.kind() != kind {
                    return Err(LogicTreeError::MixedUncertainty {
                        branch_set: set.id.clone(),
                    });
                }
            }

            if !weights_sum_to_one(set.weights()) {
                return Err(LogicTreeError::WeightSum {
                    branch_set: set.id.clone(),
                    sum: set.weights().sum(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(id: &str, weight: f64, uncertainty: Uncertainty) -> Branch {
        Branch {
            id: id.to_string(),
            weight,
            uncertainty,
            apply_to_sources: vec![],
        }
    }

    fn source_level() -> BranchSet {
        BranchSet {
            id: "bs1".to_string(),
            branches: vec![branch(
                "b1",
                1.0,
                Uncertainty::SourceModel {
                    name: "sm".to_string(),
                },
            )],
        }
    }

    #[test]
    fn empty_tree_has_no_leaves() {
        let err = LogicTree::default().validate().unwrap_err();
        assert!(matches!(err, LogicTreeError::NoLeaves { .. }));
    }

    #[test]
    fn empty_branch_set_has_no_leaves() {
        let tree = LogicTree::new(vec![
            source_level(),
            BranchSet {
                id: "bs2".to_string(),
                branches: vec![],
            },
        ]);
        assert!(matches!(
            tree.validate(),
            Err(LogicTreeError::NoLeaves { .. })
        ));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let tree = LogicTree::new(vec![
            source_level(),
            BranchSet {
                id: "bs2".to_string(),
                branches: vec![
                    branch("b2", 0.5, Uncertainty::BValueRelative { delta: 0.1 }),
                    branch("b3", 0.4, Uncertainty::BValueRelative { delta: -0.1 }),
                ],
            },
        ]);
        match tree.validate() {
            Err(LogicTreeError::WeightSum { branch_set, sum }) => {
                assert_eq!(branch_set, "bs2");
                assert!((sum - 0.9).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn zero_weight_is_allowed_negative_is_not() {
        let level = |w2: f64, w3: f64| BranchSet {
            id: "bs2".to_string(),
            branches: vec![
                branch("b2", w2, Uncertainty::BValueRelative { delta: 0.1 }),
                branch("b3", w3, Uncertainty::BValueRelative { delta: -0.1 }),
            ],
        };
        LogicTree::new(vec![source_level(), level(1.0, 0.0)]).validate().unwrap();
        match LogicTree::new(vec![source_level(), level(1.0, -0.1)]).validate() {
            Err(LogicTreeError::InvalidWeight { branch, weight }) => {
                assert_eq!(branch, "b3");
                assert_eq!(weight, -0.1);
            }
            other => panic!("unexpected {other:?}"),
        }
        let mut nan = level(1.0, 0.0);
        nan.branches[1].weight = f64::NAN;
        assert!(matches!(
            LogicTree::new(vec![source_level(), nan]).validate(),
            Err(LogicTreeError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn source_model_only_on_first_level() {
        let mut second = source_level();
        second.id = "bs2".to_string();
        second.branches[0].id = "b9".to_string();
        let tree = LogicTree::new(vec![source_level(), second]);
        assert!(matches!(
            tree.validate(),
            Err(LogicTreeError::MisplacedSourceModel { .. })
        ));
    }

    #[test]
    fn mixed_kinds_rejected() {
        let tree = LogicTree::new(vec![
            source_level(),
            BranchSet {
                id: "bs2".to_string(),
                branches: vec![
                    branch("b2", 0.5, Uncertainty::BValueRelative { delta: 0.1 }),
                    branch("b3", 0.5, Uncertainty::MaxMagRelative { delta: 0.1 }),
                ],
            },
        ]);
        assert!(matches!(
            tree.validate(),
            Err(LogicTreeError::MixedUncertainty { .. })
        ));
    }

    #[test]
    fn path_count_is_product() {
        let tree = LogicTree::new(vec![
            source_level(),
            BranchSet {
                id: "bs2".to_string(),
                branches: vec![
                    branch("b2", 0.5, Uncertainty::BValueRelative { delta: 0.1 }),
                    branch("b3", 0.5, Uncertainty::BValueRelative { delta: -0.1 }),
                ],
            },
        ]);
        tree.validate().unwrap();
        assert_eq!(tree.path_count(), 2);
    }

    #[test]
    fn filter_matches_listed_sources() {
        let mut b = branch("b", 1.0, Uncertainty::MaxMagRelative { delta: 0.2 });
        assert!(b.applies_to("any"));
        b.apply_to_sources = vec!["src_1".to_string()];
        assert!(b.applies_to("src_1"));
        assert!(!b.applies_to("src_2"));
    }
}
