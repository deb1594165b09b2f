use thiserror::Error;

/// Errors raised before a matching run starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("Invalid configuration: {field} must be a finite, non-negative number (got {value})")]
    NegativeParameter { field: &'static str, value: f64 },

    #[error("Invalid configuration: max_radius_mi ({max}) is smaller than base_radius_mi ({base})")]
    RadiusOrder { base: f64, max: f64 },

    #[error("Invalid sample: sample size must be at least 1")]
    EmptySample,
}

/// A distance computation that produced a non-finite value
///
/// Scoped to a single property; the run carries on and the property is
/// reported as failed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Non-finite distance computed for coordinates ({latitude}, {longitude})")]
pub struct NumericFault {
    pub latitude: f64,
    pub longitude: f64,
}
