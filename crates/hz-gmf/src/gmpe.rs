//! Ground-motion prediction equations.
//!
//! Both bundled models share the functional form
//!
//! ```text
//! ln Y = c1 + c2 (M - 6) + c3 (M - 6)^2
//!      + (c4 + c5 (M - 4.5)) ln sqrt(R^2 + h^2) + c6 R + c7 ln(Vs30 / 760)
//! ```
//!
//! with `R` the closest distance to the rupture plane (km), `Y` in g for PGA
//! and SA and in cm/s for PGV. Coefficients are tabulated at a few periods and
//! interpolated linearly in period; beyond the last period the last row holds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use hz_core::Imt;
use hz_core::numeric::lerp;
use hz_logictree::{Branch, Uncertainty};
use hz_source::Rupture;
use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};
use crate::site::SiteCollection;

/// Median and standard deviations of `ln Y` at one site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanStd {
    pub mean: f64,
    pub inter: f64,
    pub intra: f64,
}

impl MeanStd {
    pub fn total(&self) -> f64 {
        self.inter.hypot(self.intra)
    }
}

/// Capability: predict the distribution of a ground-motion parameter.
pub trait GroundMotionModel: Send + Sync {
    fn name(&self) -> &str;

    /// One entry per site, in collection order.
    fn mean_and_stddev(
        &self,
        rupture: &Rupture,
        sites: &SiteCollection,
        imt: &Imt,
    ) -> SimResult<Vec<MeanStd>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Coeffs {
    period: f64,
    c1: f64,
    c2: f64,
    c3: f64,
    c4: f64,
    c5: f64,
    c6: f64,
    c7: f64,
    h: f64,
    inter: f64,
    intra: f64,
}

impl Coeffs {
    #[allow(clippy::too_many_arguments)]
    const fn row(
        period: f64,
        c1: f64,
        c2: f64,
        c3: f64,
        c4: f64,
        c5: f64,
        c6: f64,
        c7: f64,
        h: f64,
        inter: f64,
        intra: f64,
    ) -> Self {
        Self {
            period,
            c1,
            c2,
            c3,
            c4,
            c5,
            c6,
            c7,
            h,
            inter,
            intra,
        }
    }

    fn blend(&self, other: &Coeffs, period: f64) -> Coeffs {
        let f = |a: f64, b: f64| lerp(period, self.period, other.period, a, b);
        Coeffs {
            period,
            c1: f(self.c1, other.c1),
            c2: f(self.c2, other.c2),
            c3: f(self.c3, other.c3),
            c4: f(self.c4, other.c4),
            c5: f(self.c5, other.c5),
            c6: f(self.c6, other.c6),
            c7: f(self.c7, other.c7),
            h: f(self.h, other.h),
            inter: f(self.inter, other.inter),
            intra: f(self.intra, other.intra),
        }
    }
}

// period (s), c1..c7, h (km), tau, phi. Row 0 is PGA.
const ACTIVE_CRUST_SA: [Coeffs; 5] = [
    Coeffs::row(0.0, 0.85, 0.60, -0.05, -1.00, 0.10, -0.0030, -0.50, 6.0, 0.35, 0.55),
    Coeffs::row(0.2, 1.55, 0.55, -0.06, -1.02, 0.10, -0.0032, -0.45, 6.5, 0.37, 0.58),
    Coeffs::row(1.0, 0.10, 0.90, -0.10, -0.90, 0.08, -0.0015, -0.65, 5.0, 0.38, 0.62),
    Coeffs::row(2.0, -0.75, 1.05, -0.12, -0.88, 0.07, -0.0010, -0.70, 4.5, 0.40, 0.64),
    Coeffs::row(3.0, -1.30, 1.15, -0.13, -0.86, 0.07, -0.0008, -0.72, 4.5, 0.41, 0.65),
];
const ACTIVE_CRUST_PGV: Coeffs =
    Coeffs::row(f64::NAN, 5.45, 1.00, -0.08, -0.95, 0.09, -0.0020, -0.60, 5.5, 0.33, 0.52);

const STABLE_CRUST_SA: [Coeffs; 5] = [
    Coeffs::row(0.0, 1.10, 0.70, -0.06, -1.10, 0.12, -0.0015, -0.30, 7.0, 0.30, 0.50),
    Coeffs::row(0.2, 1.85, 0.65, -0.07, -1.12, 0.12, -0.0016, -0.28, 7.5, 0.32, 0.52),
    Coeffs::row(1.0, 0.20, 1.00, -0.11, -0.98, 0.10, -0.0009, -0.40, 6.0, 0.34, 0.56),
    Coeffs::row(2.0, -0.70, 1.15, -0.13, -0.95, 0.09, -0.0006, -0.45, 5.5, 0.35, 0.58),
    Coeffs::row(3.0, -1.25, 1.25, -0.14, -0.93, 0.09, -0.0005, -0.47, 5.5, 0.36, 0.59),
];
const STABLE_CRUST_PGV: Coeffs =
    Coeffs::row(f64::NAN, 5.70, 1.10, -0.09, -1.05, 0.11, -0.0010, -0.40, 6.5, 0.29, 0.48);

/// Bundled attenuation relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AttenuationModel {
    ActiveCrust,
    StableCrust,
}

impl AttenuationModel {
    fn table(&self) -> (&'static [Coeffs], &'static Coeffs) {
        match self {
            AttenuationModel::ActiveCrust => (&ACTIVE_CRUST_SA, &ACTIVE_CRUST_PGV),
            AttenuationModel::StableCrust => (&STABLE_CRUST_SA, &STABLE_CRUST_PGV),
        }
    }

    fn coeffs(&self, imt: &Imt) -> SimResult<Coeffs> {
        let (rows, pgv) = self.table();
        let Some(period) = imt.spectral_period() else {
            return Ok(*pgv);
        };
        let last = rows[rows.len() - 1];
        if !(period.is_finite() && period >= 0.0) || period > 10.0 {
            return Err(SimulationError::UnsupportedImt {
                imt: imt.to_string(),
                model: self.to_string(),
            });
        }
        if period >= last.period {
            return Ok(last);
        }
        let upper = rows.iter().position(|c| c.period >= period).unwrap_or(rows.len() - 1);
        if upper == 0 {
            return Ok(rows[0]);
        }
        Ok(rows[upper - 1].blend(&rows[upper], period))
    }
}

impl fmt::Display for AttenuationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttenuationModel::ActiveCrust => write!(f, "ActiveCrust"),
            AttenuationModel::StableCrust => write!(f, "StableCrust"),
        }
    }
}

impl FromStr for AttenuationModel {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ActiveCrust" => Ok(AttenuationModel::ActiveCrust),
            "StableCrust" => Ok(AttenuationModel::StableCrust),
            other => Err(SimulationError::UnknownModel {
                name: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for AttenuationModel {
    type Error = SimulationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AttenuationModel> for String {
    fn from(value: AttenuationModel) -> Self {
        value.to_string()
    }
}

impl GroundMotionModel for AttenuationModel {
    fn name(&self) -> &str {
        match self {
            AttenuationModel::ActiveCrust => "ActiveCrust",
            AttenuationModel::StableCrust => "StableCrust",
        }
    }

    fn mean_and_stddev(
        &self,
        rupture: &Rupture,
        sites: &SiteCollection,
        imt: &Imt,
    ) -> SimResult<Vec<MeanStd>> {
        let c = self.coeffs(imt)?;
        let dm = rupture.magnitude - 6.0;
        let magnitude_term = c.c1 + c.c2 * dm + c.c3 * dm * dm;
        let geometric = c.c4 + c.c5 * (rupture.magnitude - 4.5);
        sites
            .iter()
            .map(|site| {
                let r = rupture.surface.rupture_distance(&site.location);
                let mean = magnitude_term
                    + geometric * (r * r + c.h * c.h).sqrt().ln()
                    + c.c6 * r
                    + c.c7 * (site.vs30 / 760.0).ln();
                if !mean.is_finite() {
                    return Err(SimulationError::NonFinite {
                        what: "ground motion mean",
                        value: mean,
                    });
                }
                Ok(MeanStd {
                    mean,
                    inter: c.inter,
                    intra: c.intra,
                })
            })
            .collect()
    }
}

/// Ground-motion model per tectonic region for one realization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GmpeSelection {
    by_region: BTreeMap<String, AttenuationModel>,
}

impl GmpeSelection {
    /// Start from the configured defaults and let the realization's
    /// ground-motion branches override them region by region.
    pub fn from_branches(
        defaults: &BTreeMap<String, String>,
        branches: &[&Branch],
    ) -> SimResult<Self> {
        let mut by_region = BTreeMap::new();
        for (region, model) in defaults {
            by_region.insert(region.clone(), model.parse()?);
        }
        for branch in branches {
            if let Uncertainty::GroundMotionModel {
                tectonic_region,
                model,
            } = &branch.uncertainty
            {
                by_region.insert(tectonic_region.clone(), model.parse()?);
            }
        }
        Ok(Self { by_region })
    }

    pub fn for_region(&self, region: &str) -> SimResult<&AttenuationModel> {
        self.by_region
            .get(region)
            .ok_or_else(|| SimulationError::UnknownTectonicRegion {
                region: region.to_string(),
            })
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, &AttenuationModel)> {
        self.by_region.iter().map(|(r, m)| (r.as_str(), m))
    }
}
