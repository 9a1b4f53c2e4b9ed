//! # Geodesic Distance
//! Great-circle distance on a spherical Earth (haversine).
//!
//! No input validation: callers supply sane lat/lon values.

/// Mean Earth radius used for all distance computations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two `(lat, lon)` points given in degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // rounding can push `a` a hair above 1.0 for antipodal points
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
    EARTH_RADIUS_KM * c
}
