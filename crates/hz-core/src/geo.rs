//! Geographic points and distances on a spherical earth.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::numeric::Real;

/// Mean earth radius in km.
pub const EARTH_RADIUS_KM: Real = 6371.0;

/// A location: longitude/latitude in decimal degrees, depth in km (positive down).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub lon: Real,
    pub lat: Real,
    #[cfg_attr(feature = "serde", serde(default))]
    pub depth: Real,
}

impl Point {
    pub fn new(lon: Real, lat: Real, depth: Real) -> Self {
        Self { lon, lat, depth }
    }

    pub fn surface(lon: Real, lat: Real) -> Self {
        Self::new(lon, lat, 0.0)
    }

    /// Great-circle distance in km between the surface projections.
    pub fn epicentral_distance(&self, other: &Point) -> Real {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }

    /// Straight-line distance in km including the depth difference.
    pub fn distance(&self, other: &Point) -> Real {
        let h = self.epicentral_distance(other);
        let v = self.depth - other.depth;
        (h * h + v * v).sqrt()
    }

    /// Point reached by travelling `distance_km` along `azimuth_deg` (clockwise from north).
    pub fn offset(&self, azimuth_deg: Real, distance_km: Real) -> Point {
        let delta = distance_km / EARTH_RADIUS_KM;
        let theta = azimuth_deg.to_radians();
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
        let lon2 = lon1
            + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());
        Point::new(lon2.to_degrees(), lat2.to_degrees(), self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude() {
        let a = Point::surface(0.0, 0.0);
        let b = Point::surface(0.0, 1.0);
        assert!((a.epicentral_distance(&b) - 111.19).abs() < 0.01);
    }

    #[test]
    fn depth_contributes_to_distance() {
        let a = Point::new(10.0, 45.0, 0.0);
        let b = Point::new(10.0, 45.0, 10.0);
        assert!((a.distance(&b) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn offset_then_measure() {
        let origin = Point::surface(12.0, 42.0);
        let moved = origin.offset(90.0, 25.0);
        assert!((origin.epicentral_distance(&moved) - 25.0).abs() < 1e-6);
    }
}
