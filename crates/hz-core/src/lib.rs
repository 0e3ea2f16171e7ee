//! hz-core: stable foundation for the hazard engine.
//!
//! Contains:
//! - ids (compact identifiers for calculations, realizations, ruptures, sites)
//! - numeric (Real, the weight-sum tolerance, interpolation)
//! - geo (points and great-circle distances)
//! - imt (intensity measure types)
//! - random (seed derivation and the sampling primitives built on it)
//! - error (IMT parse errors)

pub mod error;
pub mod geo;
pub mod ids;
pub mod imt;
pub mod numeric;
pub mod random;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use geo::Point;
pub use ids::*;
pub use imt::Imt;
pub use numeric::*;
pub use random::{SeedStream, derive_seed, seed_stream};
