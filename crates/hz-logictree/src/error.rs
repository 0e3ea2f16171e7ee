//! Configuration errors raised while validating or sampling a logic tree.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogicTreeError {
    #[error("Logic tree has no leaves: {what}")]
    NoLeaves { what: String },

    #[error("Branch weights of branch set {branch_set} sum to {sum}, expected 1.0")]
    WeightSum { branch_set: String, sum: f64 },

    #[error("Invalid weight {weight} on branch {branch}")]
    InvalidWeight { branch: String, weight: f64 },

    #[error("Duplicate branch id: {id}")]
    DuplicateBranch { id: String },

    #[error("Branch set {branch_set} mixes uncertainty kinds")]
    MixedUncertainty { branch_set: String },

    #[error("Source model uncertainty allowed only in the first branch set (found in {branch_set})")]
    MisplacedSourceModel { branch_set: String },
}

pub type LogicTreeResult<T> = Result<T, LogicTreeError>;
