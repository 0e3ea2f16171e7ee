//! Errors raised while simulating ground motion.

use hz_core::SiteId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Unknown ground motion model: {name}")]
    UnknownModel { name: String },

    #[error("No ground motion model configured for tectonic region {region}")]
    UnknownTectonicRegion { region: String },

    #[error("{model} does not support {imt}")]
    UnsupportedImt { imt: String, model: String },

    #[error("Correlation matrix for {imt} is not positive definite")]
    NotPositiveDefinite { imt: String },

    #[error("Shape mismatch: {what}")]
    ShapeMismatch { what: String },

    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid site {site}: {reason}")]
    InvalidSite { site: SiteId, reason: String },
}

pub type SimResult<T> = Result<T, SimulationError>;
