//! Map coordinates and planned routes.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// From a `[lon, lat]` pair as found in route geometry.
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self { lat: pair[1], lng: pair[0] }
    }

    /// From a `[lat, lon]` pair as found in route endpoints.
    pub fn from_lat_lon(pair: [f64; 2]) -> Self {
        Self { lat: pair[0], lng: pair[1] }
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub path: Vec<LatLng>,
    pub start: LatLng,
    pub end: LatLng,
}

impl RoutePlan {
    pub fn length_km(&self) -> f64 {
        self.path
            .windows(2)
            .map(|w| haversine_km(w[0], w[1]))
            .sum()
    }
}
