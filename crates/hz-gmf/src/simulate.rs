//! Per-rupture ground-motion field simulation.

use hz_core::random::truncated_normal;
use hz_core::{Imt, RuptureId, SeedStream};
use hz_source::Rupture;
use tracing::trace;

use crate::correlation::CorrelationFactor;
use crate::error::{SimResult, SimulationError};
use crate::gmpe::{GmpeSelection, GroundMotionModel};
use crate::site::SiteCollection;
use crate::sparse::GmfBatch;

/// Calculation-wide simulation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GmfParams {
    /// `None`: unbounded residuals; `Some(0.0)`: median motion only.
    pub truncation_level: Option<f64>,
    /// Sites farther than this from the rupture (km) see no motion.
    pub maximum_distance: f64,
}

/// Values of one IMT at every site of the collection, in collection order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundMotionField {
    pub imt: Imt,
    pub values: Vec<f64>,
}

/// Simulate the fields produced by one rupture, one per factor's IMT.
///
/// Draw order per IMT: one inter-event residual, then one intra-event
/// residual per site. Residuals are drawn for every site, including those
/// beyond the cut-off, so the stream position does not depend on geometry.
pub fn simulate_gmf(
    rupture: &Rupture,
    sites: &SiteCollection,
    gmpe: &dyn GroundMotionModel,
    correlation: &[CorrelationFactor],
    params: &GmfParams,
    rng: &mut SeedStream,
) -> SimResult<Vec<GroundMotionField>> {
    let within: Vec<bool> = sites
        .iter()
        .map(|s| rupture.surface.rupture_distance(&s.location) <= params.maximum_distance)
        .collect();

    let mut fields = Vec::with_capacity(correlation.len());
    for factor in correlation {
        let imt = factor.imt();
        let stats = gmpe.mean_and_stddev(rupture, sites, &imt)?;
        if stats.len() != sites.len() {
            return Err(SimulationError::ShapeMismatch {
                what: format!("{} returned {} values for {} sites", gmpe.name(), stats.len(), sites.len()),
            });
        }

        let inter = truncated_normal(rng, params.truncation_level);
        let raw: Vec<f64> = (0..sites.len())
            .map(|_| truncated_normal(rng, params.truncation_level))
            .collect();
        let intra = factor.apply(&raw)?;

        let values = stats
            .iter()
            .zip(&intra)
            .zip(&within)
            .map(|((ms, eps), &inside)| {
                if inside {
                    (ms.mean + inter * ms.inter + eps * ms.intra).exp()
                } else {
                    0.0
                }
            })
            .collect();
        fields.push(GroundMotionField { imt, values });
    }
    Ok(fields)
}

/// Simulate every rupture of one event set and pack the result per IMT.
///
/// The model for each rupture is looked up by its tectonic region; the
/// correlation factors (one per IMT) are shared by every rupture.
pub fn simulate_ruptures(
    ruptures: &[(RuptureId, &Rupture)],
    sites: &SiteCollection,
    gmpes: &GmpeSelection,
    correlation: &[CorrelationFactor],
    params: &GmfParams,
    rng: &mut SeedStream,
) -> SimResult<Vec<GmfBatch>> {
    // matrices[imt][site][rupture]
    let mut matrices =
        vec![vec![Vec::with_capacity(ruptures.len()); sites.len()]; correlation.len()];
    for (id, rupture) in ruptures {
        let gmpe = gmpes.for_region(&rupture.tectonic_region)?;
        let fields = simulate_gmf(rupture, sites, gmpe, correlation, params, rng)?;
        for (matrix, field) in matrices.iter_mut().zip(fields) {
            for (row, value) in matrix.iter_mut().zip(field.values) {
                row.push(value);
            }
        }
        trace!(rupture = %id, "simulated ground motion");
    }

    let site_ids = sites.ids();
    let rupture_ids: Vec<RuptureId> = ruptures.iter().map(|(id, _)| *id).collect();
    correlation
        .iter()
        .zip(&matrices)
        .map(|(factor, matrix)| GmfBatch::from_matrix(factor.imt(), &site_ids, &rupture_ids, matrix))
        .collect()
}
