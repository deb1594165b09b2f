/// Earth's mean radius in statute miles
pub const EARTH_RADIUS_MI: f64 = 3958.8;

/// Calculate the Haversine distance between two points in statute miles
///
/// The haversine term is clamped to `[0, 1]` before `asin`, so rounding
/// overshoot on antipodal or near-pole inputs cannot turn into NaN.
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in miles
#[inline]
pub fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_MI * c
}

/// Convert a central angle in degrees to miles along the Earth's surface
#[inline]
pub fn degrees_to_miles(degrees: f64) -> f64 {
    EARTH_RADIUS_MI * degrees.to_radians()
}
