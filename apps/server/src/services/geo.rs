//! Geo proximity: bounding-box pre-filter and haversine distance.

use crate::models::{NearbyPackage, Package};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude, as used for the bounding box.
const KM_PER_DEGREE: f64 = 111.0;

/// Rectangular latitude/longitude band, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Superset of the circle of `radius_km` around the center.
    ///
    /// Meridians converge toward the poles, so the longitude span is sized with the
    /// cosine at the box edge nearest the pole. When that edge reaches the pole, or the
    /// band would wrap past the antimeridian, the full longitude range is used instead.
    pub fn around(lat: f64, lng: f64, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;

        let poleward_lat = (lat.abs() + lat_delta).min(90.0);
        let cos_edge = poleward_lat.to_radians().cos();
        let lng_delta = if poleward_lat < 90.0 && cos_edge.is_finite() && cos_edge > f64::EPSILON {
            Some(radius_km / (KM_PER_DEGREE * cos_edge))
        } else {
            None
        };

        let (min_lng, max_lng) = match lng_delta {
            Some(delta) if lng - delta >= -180.0 && lng + delta <= 180.0 => {
                (lng - delta, lng + delta)
            }
            _ => (-180.0, 180.0),
        };

        Self {
            min_lat: lat - lat_delta,
            max_lat: lat + lat_delta,
            min_lng,
            max_lng,
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

/// Great-circle distance in kilometers between two `(lat, lng)` points.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Exact radius filter over bounding-box candidates.
///
/// Candidates without both meeting-point coordinates are dropped. Survivors are
/// ordered by distance, then by id, and carry their distance.
pub fn within_radius(
    candidates: Vec<Package>,
    center: (f64, f64),
    radius_km: f64,
) -> Vec<NearbyPackage> {
    let mut hits: Vec<NearbyPackage> = candidates
        .into_iter()
        .filter_map(|package| {
            let point = package.meeting_point()?;
            let distance_km = haversine_km(center, point);
            (distance_km <= radius_km).then_some(NearbyPackage {
                package,
                distance_km,
            })
        })
        .collect();

    hits.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.package.id.cmp(&b.package.id))
    });
    hits
}
