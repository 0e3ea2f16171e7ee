//! Spatial correlation of intra-event residuals.

use hz_core::Imt;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};
use crate::site::SiteCollection;

/// Capability: turn independent standard-normal residuals (one per site) into
/// spatially correlated ones.
pub trait CorrelationModel: Send + Sync {
    /// Lower Cholesky factor of the site correlation matrix for `imt`;
    /// `None` leaves residuals independent.
    fn factor(&self, sites: &SiteCollection, imt: &Imt) -> SimResult<Option<DMatrix<f64>>>;

    fn correlate(&self, residuals: &[f64], sites: &SiteCollection, imt: &Imt) -> SimResult<Vec<f64>> {
        CorrelationFactor::new(self, sites, imt)?.apply(residuals)
    }
}

/// Site correlation of one IMT, factored once and applied to every draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationFactor {
    imt: Imt,
    sites: usize,
    lower: Option<DMatrix<f64>>,
}

impl CorrelationFactor {
    pub fn new<C: CorrelationModel + ?Sized>(
        model: &C,
        sites: &SiteCollection,
        imt: &Imt,
    ) -> SimResult<Self> {
        Ok(Self {
            imt: *imt,
            sites: sites.len(),
            lower: model.factor(sites, imt)?,
        })
    }

    /// One factor per IMT, in IMT order.
    pub fn for_imts<C: CorrelationModel + ?Sized>(
        model: &C,
        sites: &SiteCollection,
        imts: &[Imt],
    ) -> SimResult<Vec<Self>> {
        imts.iter().map(|imt| Self::new(model, sites, imt)).collect()
    }

    pub fn imt(&self) -> Imt {
        self.imt
    }

    pub fn is_identity(&self) -> bool {
        self.lower.is_none()
    }

    pub fn apply(&self, residuals: &[f64]) -> SimResult<Vec<f64>> {
        if residuals.len() != self.sites {
            return Err(SimulationError::ShapeMismatch {
                what: format!("{} residuals for {} sites", residuals.len(), self.sites),
            });
        }
        Ok(match &self.lower {
            None => residuals.to_vec(),
            Some(lower) => (lower * DVector::from_column_slice(residuals))
                .iter()
                .copied()
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Correlation {
    /// Residuals stay independent.
    #[default]
    None,
    /// Jayaram & Baker (2009): `rho(h) = exp(-3 h / b(T))`.
    JayaramBaker2009 {
        #[serde(default)]
        vs30_clustering: bool,
    },
}

impl Correlation {
    /// Correlation range `b` (km) for the given spectral period.
    fn range(vs30_clustering: bool, period: f64) -> f64 {
        if period >= 1.0 {
            22.0 + 3.7 * period
        } else if vs30_clustering {
            8.5 + 17.2 * period
        } else {
            40.7 - 15.0 * period
        }
    }

    /// Site-to-site correlation matrix for `imt`, or `None` when uncorrelated.
    pub fn matrix(&self, sites: &SiteCollection, imt: &Imt) -> SimResult<Option<DMatrix<f64>>> {
        let Correlation::JayaramBaker2009 { vs30_clustering } = *self else {
            return Ok(None);
        };
        let period = imt.spectral_period().ok_or_else(|| SimulationError::UnsupportedImt {
            imt: imt.to_string(),
            model: "JayaramBaker2009".to_string(),
        })?;
        let b = Self::range(vs30_clustering, period);
        let locations: Vec<_> = sites.iter().map(|s| s.location).collect();
        let n = locations.len();
        Ok(Some(DMatrix::from_fn(n, n, |i, j| {
            let h = locations[i].epicentral_distance(&locations[j]);
            (-3.0 * h / b).exp()
        })))
    }
}

impl CorrelationModel for Correlation {
    fn factor(&self, sites: &SiteCollection, imt: &Imt) -> SimResult<Option<DMatrix<f64>>> {
        let Some(matrix) = self.matrix(sites, imt)? else {
            return Ok(None);
        };
        let cholesky = matrix
            .cholesky()
            .ok_or_else(|| SimulationError::NotPositiveDefinite {
                imt: imt.to_string(),
            })?;
        Ok(Some(cholesky.l()))
    }
}
