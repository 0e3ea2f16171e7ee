//! Realization sampling: Monte-Carlo paths or full end-branch enumeration.

use hz_core::random::weighted_index;
use hz_core::{Ordinal, derive_seed, seed_stream};
use serde::{Deserialize, Serialize};

use crate::error::{LogicTreeError, LogicTreeResult};
use crate::tree::{Branch, LogicTree};

/// How realizations are drawn from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SamplingMode {
    MonteCarlo { samples: u32 },
    EndBranchEnumeration,
}

impl SamplingMode {
    /// A configured sample count of 0 selects end-branch enumeration.
    pub fn from_sample_count(samples: u32) -> Self {
        if samples == 0 {
            SamplingMode::EndBranchEnumeration
        } else {
            SamplingMode::MonteCarlo { samples }
        }
    }

    pub fn is_enumeration(&self) -> bool {
        matches!(self, SamplingMode::EndBranchEnumeration)
    }
}

/// One path through the logic tree.
///
/// Progress counters live with the tracker and the store; a realization as
/// produced here is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Realization {
    pub ordinal: Ordinal,
    pub weight: f64,
    pub seed: u64,
    /// Index of the chosen branch in every branch set, in tree order.
    pub choices: Vec<usize>,
    /// Ids of the chosen branches, in tree order.
    pub path: Vec<String>,
}

impl Realization {
    fn from_choices(tree: &LogicTree, ordinal: u32, weight: f64, seed: u64, choices: Vec<usize>) -> Self {
        let path = tree
            .branch_sets
            .iter()
            .zip(&choices)
            .map(|(set, &i)| set.branches[i].id.clone())
            .collect();
        Self {
            ordinal: Ordinal(ordinal),
            weight,
            seed,
            choices,
            path,
        }
    }

    /// The chosen branches, resolved against the tree they were sampled from.
    pub fn branches<'a>(&self, tree: &'a LogicTree) -> Vec<&'a Branch> {
        tree.branch_sets
            .iter()
            .zip(&self.choices)
            .filter_map(|(set, &i)| set.branches.get(i))
            .collect()
    }
}

/// Produce the ordered realizations of `tree`.
///
/// Realization `i` always receives `derive_seed(master_seed, i)`, so the same
/// master seed reproduces the same realizations in either mode.
pub fn sample(tree: &LogicTree, mode: SamplingMode, master_seed: u64) -> LogicTreeResult<Vec<Realization>> {
    tree.validate()?;
    match mode {
        SamplingMode::MonteCarlo { samples } => monte_carlo(tree, samples, master_seed),
        SamplingMode::EndBranchEnumeration => Ok(enumerate(tree, master_seed)),
    }
}

fn monte_carlo(tree: &LogicTree, samples: u32, master_seed: u64) -> LogicTreeResult<Vec<Realization>> {
    let weight = 1.0 / f64::from(samples);
    (0..samples)
        .map(|i| {
            let seed = derive_seed(master_seed, u64::from(i));
            let mut rng = seed_stream(seed);
            let choices = tree
                .branch_sets
                .iter()
                .map(|set| {
                    let weights: Vec<f64> = set.weights().collect();
                    weighted_index(&mut rng, &weights).ok_or_else(|| LogicTreeError::NoLeaves {
                        what: format!("branch set {} has no positive weight", set.id),
                    })
                })
                .collect::<LogicTreeResult<Vec<usize>>>()?;
            Ok(Realization::from_choices(tree, i, weight, seed, choices))
        })
        .collect()
}

fn enumerate(tree: &LogicTree, master_seed: u64) -> Vec<Realization> {
    let sizes: Vec<usize> = tree.branch_sets.iter().map(|s| s.branches.len()).collect();
    let mut choices = vec![0_usize; sizes.len()];
    let mut realizations = Vec::with_capacity(tree.path_count());
    let mut ordinal = 0_u32;

    loop {
        let weight = tree
            .branch_sets
            .iter()
            .zip(&choices)
            .map(|(set, &i)| set.branches[i].weight)
            .product();
        let seed = derive_seed(master_seed, u64::from(ordinal));
        realizations.push(Realization::from_choices(tree, ordinal, weight, seed, choices.clone()));
        ordinal += 1;

        // odometer: last branch set varies fastest
        let mut level = sizes.len();
        loop {
            if level == 0 {
                return realizations;
            }
            level -= 1;
            choices[level] += 1;
            if choices[level] < sizes[level] {
                break;
            }
            choices[level] = 0;
        }
    }
}
