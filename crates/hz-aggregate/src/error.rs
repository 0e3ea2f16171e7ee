//! Aggregation errors.

use hz_core::SiteId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationError {
    #[error("Hazard curve for {imt} at site {site} increases at level {index}")]
    NonMonotonicCurve { imt: String, site: SiteId, index: usize },

    #[error("Realization weights sum to {sum}, expected 1")]
    WeightSum { sum: f64 },

    #[error("Invalid intensity measure levels: {what}")]
    InvalidLevels { what: String },

    #[error("Quantile {0} outside [0, 1]")]
    InvalidQuantile(f64),

    #[error("Probability of exceedance {0} outside (0, 1)")]
    InvalidPoe(f64),

    #[error("Invalid event set duration: {ses_per_path} x {investigation_time}")]
    InvalidDuration { ses_per_path: u32, investigation_time: f64 },

    #[error("Shape mismatch: {what}")]
    ShapeMismatch { what: String },

    #[error("Nothing to aggregate: {what}")]
    Empty { what: &'static str },
}

pub type AggResult<T> = Result<T, AggregationError>;
