//! Stochastic event set generation.
//!
//! Reproducibility contract: source `i` of a realization draws from its own
//! stream seeded with `derive_seed(realization_seed, i)`, and consumes it one
//! event set after the other (1..=ses_per_path). The rupture set of a
//! realization therefore depends only on its seed and its source model, never
//! on how sources are grouped into work units or on which worker runs them.

use hz_core::random::{poisson, uniform, weighted_index};
use hz_core::{Point, SeedStream, derive_seed, seed_stream};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SourceModelError, SourceResult};
use crate::rupture::{PlanarSurface, Rupture};
use crate::source::{SeismicSource, SourceGeometry, SourceModel};

/// Most ruptures one source may be expected to produce in one event set.
pub const MAX_EXPECTED_RUPTURES: f64 = 1.0e6;

/// Identity of an event set (or GMF set) within a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "index")]
pub enum SetOrdinal {
    /// The n-th simulation (1-based) of one realization.
    PerRealization(u32),
    /// Merge view over every event set of every realization.
    CompleteLogicTree,
}

impl SetOrdinal {
    pub fn index(&self) -> Option<u32> {
        match self {
            SetOrdinal::PerRealization(n) => Some(*n),
            SetOrdinal::CompleteLogicTree => None,
        }
    }
}

/// One simulated catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SesCatalog {
    pub ordinal: SetOrdinal,
    pub investigation_time: f64,
    pub ruptures: Vec<Rupture>,
}

/// Generate every event set of a realization from its whole source model.
pub fn generate_ses(
    model: &SourceModel,
    ses_per_path: u32,
    investigation_time: f64,
    realization_seed: u64,
) -> SourceResult<Vec<SesCatalog>> {
    model.validate()?;
    generate_unit(&model.sources, 0, ses_per_path, investigation_time, realization_seed)
}

/// Generate the contribution of a contiguous block of sources.
///
/// `first_source` is the index of `sources[0]` within the realization model;
/// it fixes the per-source streams. The result always holds `ses_per_path`
/// catalogs, possibly empty.
pub fn generate_unit(
    sources: &[SeismicSource],
    first_source: usize,
    ses_per_path: u32,
    investigation_time: f64,
    realization_seed: u64,
) -> SourceResult<Vec<SesCatalog>> {
    for source in sources {
        source.validate()?;
    }

    let mut streams: Vec<SeedStream> = (0..sources.len())
        .map(|k| seed_stream(derive_seed(realization_seed, (first_source + k) as u64)))
        .collect();

    let mut catalogs = Vec::with_capacity(ses_per_path as usize);
    for ses in 1..=ses_per_path {
        let mut ruptures = Vec::new();
        for (source, rng) in sources.iter().zip(streams.iter_mut()) {
            ruptures.extend(sample_source(source, rng, investigation_time, ses)?);
        }
        debug!(ses, first_source, ruptures = ruptures.len(), "sampled event set");
        catalogs.push(SesCatalog {
            ordinal: SetOrdinal::PerRealization(ses),
            investigation_time,
            ruptures,
        });
    }
    Ok(catalogs)
}

/// Draw the ruptures one source contributes to one event set.
fn sample_source(
    source: &SeismicSource,
    rng: &mut SeedStream,
    investigation_time: f64,
    ses: u32,
) -> SourceResult<Vec<Rupture>> {
    let bins = source.mfd.bins();
    let rates: Vec<f64> = bins.iter().map(|b| b.rate).collect();
    let expected = rates.iter().sum::<f64>() * investigation_time;
    if !expected.is_finite() {
        return Err(SourceModelError::NonFiniteRate {
            source_id: source.id.clone(),
            value: expected,
        });
    }
    if expected > MAX_EXPECTED_RUPTURES {
        return Err(SourceModelError::ExcessiveRate {
            source_id: source.id.clone(),
            expected,
            limit: MAX_EXPECTED_RUPTURES,
        });
    }

    let count = poisson(rng, expected);
    let mut ruptures = Vec::new();
    for _ in 0..count {
        let Some(bin) = weighted_index(rng, &rates) else {
            break;
        };
        let magnitude = bins[bin].magnitude;
        let hypocenter = match &source.geometry {
            SourceGeometry::Point { location } => {
                Point::new(location.lon, location.lat, source.hypo_depth)
            }
            SourceGeometry::Area {
                min_lon,
                max_lon,
                min_lat,
                max_lat,
            } => {
                let lon = min_lon + uniform(rng) * (max_lon - min_lon);
                let lat = min_lat + uniform(rng) * (max_lat - min_lat);
                Point::new(lon, lat, source.hypo_depth)
            }
        };
        let plane = source.nodal_plane;
        let surface = PlanarSurface::from_magnitude(
            magnitude,
            hypocenter,
            plane.strike,
            plane.dip,
            source.rupture_aspect_ratio,
            source.upper_seismogenic_depth,
            source.lower_seismogenic_depth,
        );
        ruptures.push(Rupture {
            source_id: source.id.clone(),
            tectonic_region: source.tectonic_region.clone(),
            ses,
            magnitude,
            rake: plane.rake,
            hypocenter,
            surface,
            occurred: true,
        });
    }
    Ok(ruptures)
}

/// Investigation time represented by the complete logic tree event set.
///
/// Sampled realizations each contribute their full `ses_per_path` catalogs;
/// enumerated realizations contribute in proportion to their weight.
pub fn complete_lt_investigation_time(
    weights: &[f64],
    enumeration: bool,
    ses_per_path: u32,
    investigation_time: f64,
) -> f64 {
    let per_realization = f64::from(ses_per_path) * investigation_time;
    weights
        .iter()
        .map(|w| if enumeration { w * per_realization } else { per_realization })
        .sum()
}
