//! Seismic source definitions.

use std::collections::HashSet;

use hz_core::{Point, SourceId};
use serde::{Deserialize, Serialize};

use crate::error::{SourceModelError, SourceResult};
use crate::mfd::Mfd;

/// Fault plane orientation used for every rupture of a source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NodalPlane {
    pub strike: f64,
    pub dip: f64,
    pub rake: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum SourceGeometry {
    /// All ruptures nucleate below a single epicenter.
    Point { location: Point },
    /// Epicenters uniformly distributed over a lon/lat box.
    Area {
        min_lon: f64,
        max_lon: f64,
        min_lat: f64,
        max_lat: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeismicSource {
    pub id: SourceId,
    #[serde(default)]
    pub name: String,
    pub tectonic_region: String,
    pub geometry: SourceGeometry,
    pub mfd: Mfd,
    pub nodal_plane: NodalPlane,
    pub upper_seismogenic_depth: f64,
    pub lower_seismogenic_depth: f64,
    pub hypo_depth: f64,
    #[serde(default = "default_aspect_ratio")]
    pub rupture_aspect_ratio: f64,
}

fn default_aspect_ratio() -> f64 {
    1.5
}

impl SeismicSource {
    fn geometry_error(&self, reason: impl Into<String>) -> SourceModelError {
        SourceModelError::InvalidGeometry {
            source_id: self.id.clone(),
            reason: reason.into(),
        }
    }

    /// Full validation of distribution, depths and geometry.
    pub fn validate(&self) -> SourceResult<()> {
        self.mfd
            .check()
            .map_err(|reason| SourceModelError::InvalidMfd {
                source_id: self.id.clone(),
                reason,
            })?;

        let NodalPlane { strike, dip, rake } = self.nodal_plane;
        if !(0.0..360.0).contains(&strike) {
            return Err(self.geometry_error(format!("strike {strike} outside [0, 360)")));
        }
        if !(dip > 0.0 && dip <= 90.0) {
            return Err(self.geometry_error(format!("dip {dip} outside (0, 90]")));
        }
        if !(-180.0..=180.0).contains(&rake) {
            return Err(self.geometry_error(format!("rake {rake} outside [-180, 180]")));
        }

        let (upper, lower) = (self.upper_seismogenic_depth, self.lower_seismogenic_depth);
        if !(upper >= 0.0 && upper < lower) {
            return Err(self.geometry_error(format!(
                "seismogenic depths {upper}..{lower} are not an interval below the surface"
            )));
        }
        if !(upper..=lower).contains(&self.hypo_depth) {
            return Err(self.geometry_error(format!(
                "hypocentral depth {} outside seismogenic layer",
                self.hypo_depth
            )));
        }
        if !(self.rupture_aspect_ratio.is_finite() && self.rupture_aspect_ratio > 0.0) {
            return Err(self.geometry_error("rupture aspect ratio must be positive"));
        }

        match &self.geometry {
            SourceGeometry::Point { location } => {
                if !valid_lon_lat(location.lon, location.lat) {
                    return Err(self.geometry_error("point location out of range"));
                }
            }
            SourceGeometry::Area {
                min_lon,
                max_lon,
                min_lat,
                max_lat,
            } => {
                if !valid_lon_lat(*min_lon, *min_lat) || !valid_lon_lat(*max_lon, *max_lat) {
                    return Err(self.geometry_error("area corners out of range"));
                }
                if min_lon >= max_lon || min_lat >= max_lat {
                    return Err(self.geometry_error("area box is empty"));
                }
            }
        }
        Ok(())
    }
}

fn valid_lon_lat(lon: f64, lat: f64) -> bool {
    (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

/// Ordered collection of sources; immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceModel {
    pub name: String,
    pub sources: Vec<SeismicSource>,
}

impl SourceModel {
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Validate every source; the first malformed one aborts.
    pub fn validate(&self) -> SourceResult<()> {
        let mut ids = HashSet::new();
        for source in &self.sources {
            if !ids.insert(source.id.as_str()) {
                return Err(SourceModelError::DuplicateSource {
                    source_id: source.id.clone(),
                });
            }
            source.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn point_source(id: &str, a_val: f64) -> SeismicSource {
        SeismicSource {
            id: id.to_string(),
            name: format!("Point {id}"),
            tectonic_region: "Active Shallow Crust".to_string(),
            geometry: SourceGeometry::Point {
                location: Point::surface(0.0, 0.0),
            },
            mfd: Mfd::TruncatedGutenbergRichter {
                a_val,
                b_val: 1.0,
                min_mag: 5.0,
                max_mag: 6.5,
                bin_width: 0.1,
            },
            nodal_plane: NodalPlane {
                strike: 0.0,
                dip: 90.0,
                rake: 0.0,
            },
            upper_seismogenic_depth: 0.0,
            lower_seismogenic_depth: 20.0,
            hypo_depth: 10.0,
            rupture_aspect_ratio: 1.5,
        }
    }

    pub fn area_source(id: &str) -> SeismicSource {
        SeismicSource {
            geometry: SourceGeometry::Area {
                min_lon: -0.5,
                max_lon: 0.5,
                min_lat: -0.5,
                max_lat: 0.5,
            },
            ..point_source(id, 3.5)
        }
    }
}
