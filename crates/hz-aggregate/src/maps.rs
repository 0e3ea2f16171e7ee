//! Hazard maps: ground-motion level at a target probability of exceedance.

use crate::error::{AggResult, AggregationError};
use crate::types::{HazardCurveSet, HazardMapSet};

/// Level at which the curve reaches `poe`.
///
/// Interpolates log-log inside the bracketing segment (linear when the lower
/// PoE is zero) and clamps to the first/last level outside the curve's range.
/// Returns the index of the offending level when the curve increases.
pub(crate) fn map_value(imls: &[f64], poes: &[f64], poe: f64) -> Result<f64, usize> {
    if let Some(i) = poes.windows(2).position(|w| w[1] > w[0]) {
        return Err(i + 1);
    }
    let (first, last) = (0, imls.len() - 1);
    if poe >= poes[first] {
        return Ok(imls[first]);
    }
    if poe <= poes[last] {
        return Ok(imls[last]);
    }
    let i = poes.windows(2).position(|w| w[0] >= poe && poe >= w[1]).unwrap_or(last - 1);
    let (p0, p1) = (poes[i], poes[i + 1]);
    let (x0, x1) = (imls[i], imls[i + 1]);
    if p0 == p1 {
        return Ok(x0);
    }
    if p1 > 0.0 {
        let t = (poe.ln() - p0.ln()) / (p1.ln() - p0.ln());
        Ok((x0.ln() + t * (x1.ln() - x0.ln())).exp())
    } else {
        Ok(x0 + (poe - p0) / (p1 - p0) * (x1 - x0))
    }
}

/// One map per requested PoE for a set of curves.
pub fn hazard_maps(curves: &HazardCurveSet, poes: &[f64]) -> AggResult<Vec<HazardMapSet>> {
    if curves.imls.is_empty() {
        return Err(AggregationError::InvalidLevels {
            what: "no levels".to_string(),
        });
    }
    poes.iter()
        .map(|&poe| {
            if !(poe > 0.0 && poe < 1.0) {
                return Err(AggregationError::InvalidPoe(poe));
            }
            let values = curves
                .sites
                .iter()
                .zip(&curves.poes)
                .map(|(&site, curve)| {
                    if curve.len() != curves.imls.len() {
                        return Err(AggregationError::ShapeMismatch {
                            what: format!("site {site}: {} poes for {} levels", curve.len(), curves.imls.len()),
                        });
                    }
                    map_value(&curves.imls, curve, poe).map_err(|index| {
                        AggregationError::NonMonotonicCurve {
                            imt: curves.imt.to_string(),
                            site,
                            index,
                        }
                    })
                })
                .collect::<AggResult<Vec<_>>>()?;
            Ok(HazardMapSet {
                imt: curves.imt,
                kind: curves.kind,
                poe,
                sites: curves.sites.clone(),
                values,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CurveKind;
    use hz_core::{Imt, SiteId};

    const IMLS: [f64; 4] = [0.01, 0.1, 0.2, 0.5];

    #[test]
    fn exact_on_grid_points() {
        let poes = [0.9, 0.5, 0.1, 0.01];
        assert!((map_value(&IMLS, &poes, 0.5).unwrap() - 0.1).abs() < 1e-12);
        assert!((map_value(&IMLS, &poes, 0.1).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn interpolates_inside_segment() {
        let poes = [0.9, 0.5, 0.1, 0.01];
        let v = map_value(&IMLS, &poes, 0.3).unwrap();
        assert!(v > 0.1 && v < 0.2);
    }

    #[test]
    fn clamps_outside_range() {
        let poes = [0.9, 0.5, 0.1, 0.01];
        assert_eq!(map_value(&IMLS, &poes, 0.95).unwrap(), 0.01);
        assert_eq!(map_value(&IMLS, &poes, 0.001).unwrap(), 0.5);
        let flat_zero = [0.0; 4];
        assert_eq!(map_value(&IMLS, &flat_zero, 0.1).unwrap(), 0.01);
    }

    #[test]
    fn zero_tail_is_linear() {
        let poes = [0.4, 0.2, 0.0, 0.0];
        let v = map_value(&IMLS, &poes, 0.1).unwrap();
        assert!((v - 0.15).abs() < 1e-12);
    }

    #[test]
    fn increasing_curve_is_rejected() {
        let set = HazardCurveSet {
            imt: Imt::Pga,
            kind: CurveKind::Mean,
            imls: IMLS.to_vec(),
            sites: vec![SiteId(3)],
            poes: vec![vec![0.5, 0.6, 0.1, 0.0]],
        };
        assert_eq!(
            hazard_maps(&set, &[0.1]),
            Err(AggregationError::NonMonotonicCurve {
                imt: "PGA".to_string(),
                site: SiteId(3),
                index: 1
            })
        );
        assert!(matches!(
            hazard_maps(&set, &[1.0]),
            Err(AggregationError::InvalidPoe(_))
        ));
    }
}
