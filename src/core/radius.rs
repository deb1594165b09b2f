use crate::core::error::MatchError;
use crate::models::MatchConfig;

/// Coverage-radius rule derived from a validated [`MatchConfig`]
///
/// `radius_mi(size) = min(max_radius_mi, base_radius_mi + radius_per_inch_mi * size)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusPolicy {
    min_hail_size_in: f64,
    base_radius_mi: f64,
    radius_per_inch_mi: f64,
    max_radius_mi: f64,
}

impl RadiusPolicy {
    /// Validate a configuration and build the policy from it
    pub fn new(config: &MatchConfig) -> Result<Self, MatchError> {
        check_parameter("min_hail_size_in", config.min_hail_size_in)?;
        check_parameter("base_radius_mi", config.base_radius_mi)?;
        check_parameter("radius_per_inch_mi", config.radius_per_inch_mi)?;
        check_parameter("max_radius_mi", config.max_radius_mi)?;

        if config.max_radius_mi < config.base_radius_mi {
            return Err(MatchError::RadiusOrder {
                base: config.base_radius_mi,
                max: config.max_radius_mi,
            });
        }

        Ok(Self {
            min_hail_size_in: config.min_hail_size_in,
            base_radius_mi: config.base_radius_mi,
            radius_per_inch_mi: config.radius_per_inch_mi,
            max_radius_mi: config.max_radius_mi,
        })
    }

    /// Coverage radius in miles for an event of the given hail size
    #[inline]
    pub fn radius_mi(&self, hail_size_in: f64) -> f64 {
        (self.base_radius_mi + self.radius_per_inch_mi * hail_size_in).min(self.max_radius_mi)
    }

    /// Whether an event of this size is large enough to be considered at all
    #[inline]
    pub fn qualifies(&self, hail_size_in: f64) -> bool {
        hail_size_in >= self.min_hail_size_in
    }

    pub fn min_hail_size_in(&self) -> f64 {
        self.min_hail_size_in
    }
}

impl MatchConfig {
    /// Reject configurations the matcher cannot run with
    pub fn validate(&self) -> Result<(), MatchError> {
        RadiusPolicy::new(self).map(|_| ())
    }
}

fn check_parameter(field: &'static str, value: f64) -> Result<(), MatchError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MatchError::NegativeParameter { field, value })
    }
}
