//! Seismic source models and stochastic event set generation.
//!
//! Provides:
//! - Magnitude-frequency distributions (truncated Gutenberg-Richter, evenly discretized)
//! - Point and area sources with their rupture geometry
//! - Logic-tree path application (source model selection + MFD perturbations)
//! - Poisson sampling of rupture catalogs per stochastic event set

pub mod apply;
pub mod error;
pub mod mfd;
pub mod rupture;
pub mod ses;
pub mod source;

pub use apply::apply_path;
pub use error::{SourceModelError, SourceResult};
pub use mfd::{MAX_MAGNITUDE_BINS, MagnitudeBin, Mfd};
pub use rupture::{PlanarSurface, Rupture};
pub use ses::{
    MAX_EXPECTED_RUPTURES, SesCatalog, SetOrdinal, complete_lt_investigation_time, generate_ses,
    generate_unit,
};
pub use source::{NodalPlane, SeismicSource, SourceGeometry, SourceModel};
