//! Great-circle distance between coordinates.

use relief_map_geography_models::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two latitude/longitude pairs.
///
/// The intermediate term is clamped to `[0, 1]` so floating-point error at
/// coincident or antipodal points can never produce a negative square root
/// argument.
#[must_use]
pub fn haversine_distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

/// Haversine distance in meters between two [`Coordinate`]s.
#[must_use]
pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
}
