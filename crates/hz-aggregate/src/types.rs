//! Curve and map containers.

use hz_core::{Imt, Ordinal, SiteId};
use serde::{Deserialize, Serialize};

/// Which curve (or map) a result represents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CurveKind {
    Realization(Ordinal),
    Mean,
    Quantile(f64),
}

impl CurveKind {
    pub fn label(&self) -> String {
        match self {
            CurveKind::Realization(o) => format!("rlz-{o}"),
            CurveKind::Mean => "mean".to_string(),
            CurveKind::Quantile(q) => format!("quantile-{q}"),
        }
    }
}

/// Hazard curves of one IMT and kind for every site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardCurveSet {
    pub imt: Imt,
    pub kind: CurveKind,
    pub imls: Vec<f64>,
    pub sites: Vec<SiteId>,
    /// `poes[site][level]`
    pub poes: Vec<Vec<f64>>,
}

/// Ground-motion levels of one IMT, kind and PoE for every site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardMapSet {
    pub imt: Imt,
    pub kind: CurveKind,
    pub poe: f64,
    pub sites: Vec<SiteId>,
    pub values: Vec<f64>,
}

/// Every curve of one realization, with its weight.
#[derive(Debug, Clone, PartialEq)]
pub struct RealizationCurves {
    pub ordinal: Ordinal,
    pub weight: f64,
    pub curves: Vec<HazardCurveSet>,
}
