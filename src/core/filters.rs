use crate::models::{PropertyRecord, StormEvent};

/// Check that a coordinate pair is finite and inside WGS84 bounds
#[inline]
pub fn has_valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Coordinates of a property, if it has a usable pair
#[inline]
pub fn property_coordinates(property: &PropertyRecord) -> Option<(f64, f64)> {
    match (property.latitude, property.longitude) {
        (Some(lat), Some(lon)) if has_valid_coordinates(lat, lon) => Some((lat, lon)),
        _ => None,
    }
}

/// Check that an event is well-formed
///
/// Coordinates must be in range and a reported hail size must be a finite,
/// non-negative number. A missing size is acceptable.
#[inline]
pub fn is_valid_event(event: &StormEvent) -> bool {
    if !has_valid_coordinates(event.latitude, event.longitude) {
        return false;
    }

    match event.hail_size_in {
        Some(size) => size.is_finite() && size >= 0.0,
        None => true,
    }
}
