//! Realization hazard curves from ground-motion values.

use std::collections::BTreeMap;

use hz_core::{Imt, Ordinal, SiteId};

use crate::error::{AggResult, AggregationError};
use crate::types::{CurveKind, HazardCurveSet};

pub(crate) fn check_levels(imls: &[f64]) -> AggResult<()> {
    if imls.is_empty() {
        return Err(AggregationError::InvalidLevels {
            what: "no levels".to_string(),
        });
    }
    if imls.iter().any(|l| !l.is_finite() || *l <= 0.0) {
        return Err(AggregationError::InvalidLevels {
            what: "levels must be finite and positive".to_string(),
        });
    }
    if imls.windows(2).any(|w| w[0] >= w[1]) {
        return Err(AggregationError::InvalidLevels {
            what: "levels must be strictly increasing".to_string(),
        });
    }
    Ok(())
}

/// Probability of at least one exceedance of each level in `investigation_time`.
///
/// The event sets of a realization span `ses_per_path * investigation_time`
/// years, so the annual exceedance rate of `iml` is
/// `count(gmv >= iml) / (ses_per_path * investigation_time)` and the Poisson
/// PoE over the investigation time is `1 - exp(-rate * investigation_time)`.
pub fn hazard_curve(
    gmvs: &[f64],
    imls: &[f64],
    ses_per_path: u32,
    investigation_time: f64,
) -> AggResult<Vec<f64>> {
    check_levels(imls)?;
    if ses_per_path == 0 || !(investigation_time.is_finite() && investigation_time > 0.0) {
        return Err(AggregationError::InvalidDuration {
            ses_per_path,
            investigation_time,
        });
    }
    let duration = f64::from(ses_per_path) * investigation_time;
    Ok(imls
        .iter()
        .map(|&iml| {
            let exceedances = gmvs.iter().filter(|&&v| v >= iml).count() as f64;
            let rate = exceedances / duration;
            1.0 - (-rate * investigation_time).exp()
        })
        .collect())
}

/// Curves of one realization and IMT for every site; a site without values
/// gets an all-zero curve.
pub fn realization_curves(
    ordinal: Ordinal,
    imt: Imt,
    imls: &[f64],
    sites: &[SiteId],
    gmvs: &BTreeMap<SiteId, Vec<f64>>,
    ses_per_path: u32,
    investigation_time: f64,
) -> AggResult<HazardCurveSet> {
    let poes = sites
        .iter()
        .map(|site| {
            let values = gmvs.get(site).map(Vec::as_slice).unwrap_or(&[]);
            hazard_curve(values, imls, ses_per_path, investigation_time)
        })
        .collect::<AggResult<Vec<_>>>()?;
    Ok(HazardCurveSet {
        imt,
        kind: CurveKind::Realization(ordinal),
        imls: imls.to_vec(),
        sites: sites.to_vec(),
        poes,
    })
}
