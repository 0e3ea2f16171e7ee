//! Logic tree model and realization sampler.
//!
//! A logic tree is an ordered list of branch sets. A realization picks one
//! branch from every branch set; its weight is either uniform (Monte-Carlo
//! sampling) or the product of the chosen branch weights (end-branch
//! enumeration).

pub mod error;
pub mod sampler;
pub mod tree;

pub use error::{LogicTreeError, LogicTreeResult};
pub use sampler::{Realization, SamplingMode, sample};
pub use tree::{Branch, BranchSet, LogicTree, Uncertainty, UncertaintyKind};
