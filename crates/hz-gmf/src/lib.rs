//! Ground-motion field simulation.
//!
//! Provides:
//! - Site collections (location + Vs30)
//! - Ground-motion models (median and aleatory variability per site)
//! - Spatial correlation of intra-event residuals
//! - Per-rupture field simulation with truncation and distance cut-off
//! - Sparse per-site batches ready for persistence

pub mod correlation;
pub mod error;
pub mod gmpe;
pub mod simulate;
pub mod site;
pub mod sparse;

pub use correlation::{Correlation, CorrelationFactor, CorrelationModel};
pub use error::{SimResult, SimulationError};
pub use gmpe::{AttenuationModel, GmpeSelection, GroundMotionModel, MeanStd};
pub use simulate::{GmfParams, GroundMotionField, simulate_gmf, simulate_ruptures};
pub use site::{Site, SiteCollection};
pub use sparse::{GmfBatch, GmfSiteRecord};
