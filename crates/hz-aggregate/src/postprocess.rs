//! Statistics and maps over the curves of every realization.

use hz_core::Imt;
use serde::{Deserialize, Serialize};

use crate::error::{AggResult, AggregationError};
use crate::maps::hazard_maps;
use crate::stats::{check_weights, weighted_mean, weighted_quantile};
use crate::types::{CurveKind, HazardCurveSet, HazardMapSet, RealizationCurves};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRequest {
    pub mean: bool,
    pub quantiles: Vec<f64>,
    /// Probabilities of exceedance for maps; empty means no maps.
    pub poes: Vec<f64>,
}

impl StatisticsRequest {
    pub fn wants_statistics(&self) -> bool {
        self.mean || !self.quantiles.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostProcessed {
    /// Realization curves first (realization order, then IMT order), then
    /// statistical curves per IMT.
    pub curves: Vec<HazardCurveSet>,
    /// One map per curve per PoE, in curve order.
    pub maps: Vec<HazardMapSet>,
}

/// Combine realizations into statistical curves and invert every curve into
/// maps.
///
/// Every realization must carry one curve set per IMT on the same sites and
/// levels, in the same IMT order.
pub fn post_process(
    realizations: &[RealizationCurves],
    request: &StatisticsRequest,
) -> AggResult<PostProcessed> {
    let Some(first) = realizations.first() else {
        return Err(AggregationError::Empty { what: "realizations" });
    };
    for rlz in realizations {
        if rlz.curves.len() != first.curves.len() {
            return Err(AggregationError::ShapeMismatch {
                what: format!(
                    "realization {} has {} curve sets, expected {}",
                    rlz.ordinal,
                    rlz.curves.len(),
                    first.curves.len()
                ),
            });
        }
    }

    let mut curves: Vec<HazardCurveSet> = realizations
        .iter()
        .flat_map(|r| r.curves.iter().cloned())
        .collect();

    if request.wants_statistics() {
        let weights: Vec<f64> = realizations.iter().map(|r| r.weight).collect();
        check_weights(&weights)?;
        for q in &request.quantiles {
            if !(0.0..=1.0).contains(q) {
                return Err(AggregationError::InvalidQuantile(*q));
            }
        }
        for (i, template) in first.curves.iter().enumerate() {
            let sets: Vec<&HazardCurveSet> = realizations.iter().map(|r| &r.curves[i]).collect();
            check_alignment(template, &sets)?;
            if request.mean {
                curves.push(statistic(template, &sets, CurveKind::Mean, |v| {
                    weighted_mean(v, &weights)
                })?);
            }
            for &q in &request.quantiles {
                curves.push(statistic(template, &sets, CurveKind::Quantile(q), |v| {
                    weighted_quantile(v, &weights, q)
                })?);
            }
        }
    }

    let mut maps = Vec::with_capacity(curves.len() * request.poes.len());
    for set in &curves {
        maps.extend(hazard_maps(set, &request.poes)?);
    }
    Ok(PostProcessed { curves, maps })
}

fn check_alignment(template: &HazardCurveSet, sets: &[&HazardCurveSet]) -> AggResult<()> {
    let mismatch = |what: &str, imt: &Imt| AggregationError::ShapeMismatch {
        what: format!("{what} differ between realizations for {imt}"),
    };
    for set in sets {
        if set.imt != template.imt {
            return Err(mismatch("IMTs", &template.imt));
        }
        if set.imls != template.imls {
            return Err(mismatch("levels", &template.imt));
        }
        if set.sites != template.sites {
            return Err(mismatch("sites", &template.imt));
        }
        if set.poes.iter().any(|c| c.len() != template.imls.len()) {
            return Err(mismatch("curve lengths", &template.imt));
        }
    }
    Ok(())
}

/// Apply `reduce` level by level, site by site, across realizations.
fn statistic(
    template: &HazardCurveSet,
    sets: &[&HazardCurveSet],
    kind: CurveKind,
    reduce: impl Fn(&[f64]) -> AggResult<f64>,
) -> AggResult<HazardCurveSet> {
    let poes = (0..template.sites.len())
        .map(|s| {
            (0..template.imls.len())
                .map(|l| {
                    let column: Vec<f64> = sets.iter().map(|set| set.poes[s][l]).collect();
                    reduce(&column)
                })
                .collect::<AggResult<Vec<f64>>>()
        })
        .collect::<AggResult<Vec<_>>>()?;
    Ok(HazardCurveSet {
        imt: template.imt,
        kind,
        imls: template.imls.clone(),
        sites: template.sites.clone(),
        poes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hz_core::{Ordinal, SiteId};

    fn set(ordinal: u32, imt: Imt, poes: Vec<Vec<f64>>) -> HazardCurveSet {
        HazardCurveSet {
            imt,
            kind: CurveKind::Realization(Ordinal(ordinal)),
            imls: vec![0.1, 0.2, 0.4],
            sites: (0..poes.len() as u32).map(SiteId).collect(),
            poes,
        }
    }

    fn realizations() -> Vec<RealizationCurves> {
        let a = vec![vec![0.5, 0.2, 0.05], vec![0.3, 0.1, 0.0]];
        let b = vec![vec![0.7, 0.4, 0.1], vec![0.1, 0.05, 0.0]];
        vec![
            RealizationCurves {
                ordinal: Ordinal(0),
                weight: 0.5,
                curves: vec![set(0, Imt::Pga, a.clone()), set(0, Imt::sa(1.0), a)],
            },
            RealizationCurves {
                ordinal: Ordinal(1),
                weight: 0.5,
                curves: vec![set(1, Imt::Pga, b.clone()), set(1, Imt::sa(1.0), b)],
            },
        ]
    }

    #[test]
    fn cardinality_matches_request() {
        let request = StatisticsRequest {
            mean: true,
            quantiles: vec![0.15, 0.85],
            poes: vec![0.1, 0.2],
        };
        let out = post_process(&realizations(), &request).unwrap();
        // 2 IMTs x 2 realizations + 2 IMTs x (mean + 2 quantiles)
        assert_eq!(out.curves.len(), 10);
        assert_eq!(out.maps.len(), 20);
        assert_eq!(
            out.curves.iter().filter(|c| c.kind == CurveKind::Mean).count(),
            2
        );
    }

    #[test]
    fn statistics_skipped_when_not_requested() {
        let request = StatisticsRequest {
            mean: false,
            quantiles: vec![],
            poes: vec![0.1],
        };
        let out = post_process(&realizations(), &request).unwrap();
        assert_eq!(out.curves.len(), 4);
        assert_eq!(out.maps.len(), 4);
    }

    #[test]
    fn mean_curve_values() {
        let request = StatisticsRequest {
            mean: true,
            ..StatisticsRequest::default()
        };
        let out = post_process(&realizations(), &request).unwrap();
        let mean = out.curves.iter().find(|c| c.kind == CurveKind::Mean).unwrap();
        assert!((mean.poes[0][0] - 0.6).abs() < 1e-12);
        assert!((mean.poes[1][1] - 0.075).abs() < 1e-12);
    }

    #[test]
    fn bad_weights_fail_statistics_only() {
        let mut rlzs = realizations();
        rlzs[1].weight = 0.2;
        let request = StatisticsRequest {
            mean: true,
            ..StatisticsRequest::default()
        };
        assert!(matches!(
            post_process(&rlzs, &request),
            Err(AggregationError::WeightSum { .. })
        ));
        assert!(post_process(&rlzs, &StatisticsRequest::default()).is_ok());
    }

    #[test]
    fn enumerated_quantiles_stay_monotone() {
        // 0.6/0.4 x 0.7/0.3 end branches
        let rows = [
            (0.42, vec![0.6, 0.4, 0.1]),
            (0.18, vec![0.73, 0.36, 0.05]),
            (0.28, vec![0.0, 0.0, 0.0]),
            (0.12, vec![0.77, 0.35, 0.2]),
        ];
        let rlzs: Vec<RealizationCurves> = rows
            .iter()
            .enumerate()
            .map(|(i, (weight, poes))| RealizationCurves {
                ordinal: Ordinal(i as u32),
                weight: *weight,
                curves: vec![set(i as u32, Imt::Pga, vec![poes.clone()])],
            })
            .collect();
        let request = StatisticsRequest {
            mean: true,
            quantiles: vec![0.15, 0.5, 0.85],
            poes: vec![0.1, 0.3],
        };
        let out = post_process(&rlzs, &request).unwrap();
        assert_eq!(out.curves.len(), 8);
        assert_eq!(out.maps.len(), 16);

        for curve in out.curves.iter().filter(|c| matches!(c.kind, CurveKind::Quantile(_))) {
            for w in curve.poes[0].windows(2) {
                assert!(w[0] >= w[1], "{:?}: {:?}", curve.kind, curve.poes[0]);
            }
        }
        let median = out
            .curves
            .iter()
            .find(|c| c.kind == CurveKind::Quantile(0.5))
            .unwrap();
        assert_eq!(median.poes[0], vec![0.6, 0.36, 0.1]);
    }

    #[test]
    fn empty_input_rejected() {
        assert!(post_process(&[], &StatisticsRequest::default()).is_err());
    }
}
