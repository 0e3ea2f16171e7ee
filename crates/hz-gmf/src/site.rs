//! Sites at which ground motion is computed.

use std::collections::HashSet;

use hz_core::{Point, SiteId};
use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: SiteId,
    pub location: Point,
    /// Time-averaged shear-wave velocity of the top 30 m (m/s).
    pub vs30: f64,
    #[serde(default)]
    pub vs30_measured: bool,
}

/// Ordered, validated set of sites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SiteCollection {
    sites: Vec<Site>,
}

impl SiteCollection {
    pub fn new(sites: Vec<Site>) -> SimResult<Self> {
        let mut seen = HashSet::new();
        for site in &sites {
            if !seen.insert(site.id) {
                return Err(SimulationError::InvalidSite {
                    site: site.id,
                    reason: "duplicate id".to_string(),
                });
            }
            if !(site.vs30.is_finite() && site.vs30 > 0.0) {
                return Err(SimulationError::InvalidSite {
                    site: site.id,
                    reason: format!("vs30 {} must be positive", site.vs30),
                });
            }
            let Point { lon, lat, .. } = site.location;
            if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
                return Err(SimulationError::InvalidSite {
                    site: site.id,
                    reason: format!("location ({lon}, {lat}) out of range"),
                });
            }
        }
        Ok(Self { sites })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    pub fn as_slice(&self) -> &[Site] {
        &self.sites
    }

    pub fn ids(&self) -> Vec<SiteId> {
        self.sites.iter().map(|s| s.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: u32, vs30: f64) -> Site {
        Site {
            id: SiteId(id),
            location: Point::surface(10.0, 45.0),
            vs30,
            vs30_measured: true,
        }
    }

    #[test]
    fn rejects_duplicates_and_bad_vs30() {
        assert!(SiteCollection::new(vec![site(1, 400.0), site(2, 800.0)]).is_ok());
        assert!(matches!(
            SiteCollection::new(vec![site(1, 400.0), site(1, 800.0)]),
            Err(SimulationError::InvalidSite { .. })
        ));
        assert!(SiteCollection::new(vec![site(3, 0.0)]).is_err());
    }
}
