//! Synthetic ruptures and their planar surfaces.

use hz_core::geo::EARTH_RADIUS_KM;
use hz_core::{Point, SourceId};
use serde::{Deserialize, Serialize};

/// Rectangular fault plane centred (in map view) on the hypocenter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlanarSurface {
    pub strike: f64,
    pub dip: f64,
    /// Along-strike length (km).
    pub length: f64,
    /// Down-dip width (km).
    pub width: f64,
    pub top_depth: f64,
    pub bottom_depth: f64,
    /// Surface projection of the plane's centre.
    pub center: Point,
}

impl PlanarSurface {
    /// Plane for magnitude `mag` using the Wells & Coppersmith (1994) all-slip
    /// area relation `log10(A) = -3.49 + 0.91 M`, constrained to the
    /// seismogenic layer.
    pub fn from_magnitude(
        mag: f64,
        hypocenter: Point,
        strike: f64,
        dip: f64,
        aspect_ratio: f64,
        upper_depth: f64,
        lower_depth: f64,
    ) -> Self {
        let area = 10_f64.powf(-3.49 + 0.91 * mag);
        let sin_dip = dip.to_radians().sin();
        let mut width = (area / aspect_ratio).sqrt();
        let mut length = width * aspect_ratio;
        let max_width = (lower_depth - upper_depth) / sin_dip;
        if width > max_width {
            width = max_width;
            length = area / width;
        }
        let vertical = width * sin_dip;
        let deepest_top = (lower_depth - vertical).max(upper_depth);
        let top_depth = (hypocenter.depth - vertical / 2.0).clamp(upper_depth, deepest_top);
        Self {
            strike,
            dip,
            length,
            width,
            top_depth,
            bottom_depth: top_depth + vertical,
            center: Point::surface(hypocenter.lon, hypocenter.lat),
        }
    }

    /// Site offset from the centre in strike-aligned km: (along strike, across strike).
    fn local_offset(&self, site: &Point) -> (f64, f64) {
        let km_per_deg = EARTH_RADIUS_KM.to_radians();
        let dx = (site.lon - self.center.lon) * km_per_deg * self.center.lat.to_radians().cos();
        let dy = (site.lat - self.center.lat) * km_per_deg;
        let theta = self.strike.to_radians();
        let along = dx * theta.sin() + dy * theta.cos();
        let across = dx * theta.cos() - dy * theta.sin();
        (along, across)
    }

    /// Closest horizontal distance to the surface projection (km).
    pub fn joyner_boore_distance(&self, site: &Point) -> f64 {
        let (along, across) = self.local_offset(site);
        let half_length = self.length / 2.0;
        let half_projected_width = self.width * self.dip.to_radians().cos() / 2.0;
        let ds = (along.abs() - half_length).max(0.0);
        let dp = (across.abs() - half_projected_width).max(0.0);
        (ds * ds + dp * dp).sqrt()
    }

    /// Approximate closest distance to the plane (km).
    pub fn rupture_distance(&self, site: &Point) -> f64 {
        let rjb = self.joyner_boore_distance(site);
        (rjb * rjb + self.top_depth * self.top_depth).sqrt()
    }
}

/// A single synthetic earthquake.
///
/// Ruptures in a catalog always occurred; ids are assigned by the store when
/// the catalog is appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rupture {
    pub source_id: SourceId,
    pub tectonic_region: String,
    /// 1-based stochastic event set index within the realization.
    pub ses: u32,
    pub magnitude: f64,
    pub rake: f64,
    pub hypocenter: Point,
    pub surface: PlanarSurface,
    pub occurred: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(mag: f64) -> PlanarSurface {
        PlanarSurface::from_magnitude(mag, Point::new(0.0, 0.0, 10.0), 0.0, 90.0, 1.5, 0.0, 20.0)
    }

    #[test]
    fn larger_events_have_larger_planes() {
        let small = surface(5.0);
        let large = surface(7.0);
        assert!(large.length * large.width > small.length * small.width);
    }

    #[test]
    fn plane_stays_in_seismogenic_layer() {
        for mag in [5.0, 6.0, 7.0, 8.0] {
            let s = surface(mag);
            assert!(s.top_depth >= 0.0);
            assert!(s.bottom_depth <= 20.0 + 1e-9, "mag {mag}: bottom {}", s.bottom_depth);
        }
    }

    #[test]
    fn distances_along_strike() {
        let s = surface(6.0);
        let on_plane = Point::surface(0.0, 0.0);
        assert_eq!(s.joyner_boore_distance(&on_plane), 0.0);
        assert!((s.rupture_distance(&on_plane) - s.top_depth).abs() < 1e-9);

        // 1 degree north lies along strike for a north-striking plane
        let north = Point::surface(0.0, 1.0);
        let expected = EARTH_RADIUS_KM.to_radians() - s.length / 2.0;
        assert!((s.joyner_boore_distance(&north) - expected).abs() < 1e-6);
    }
}
