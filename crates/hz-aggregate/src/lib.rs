//! Hazard curves, statistics and hazard maps.
//!
//! Realization curves come from ground-motion values; statistical curves
//! (weighted mean, weighted quantiles) combine realizations site by site;
//! maps invert every curve at the requested probabilities of exceedance.

pub mod curves;
pub mod error;
pub mod maps;
pub mod postprocess;
pub mod stats;
pub mod types;

pub use curves::{hazard_curve, realization_curves};
pub use error::{AggResult, AggregationError};
pub use maps::hazard_maps;
pub use postprocess::{PostProcessed, StatisticsRequest, post_process};
pub use stats::{weighted_mean, weighted_quantile};
pub use types::{CurveKind, HazardCurveSet, HazardMapSet, RealizationCurves};
