use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::models::domain::{EstimateMode, MatchConfig, SampleSpec};

/// Request to run property matching
///
/// Every field is optional on the wire; omitted fields take the service defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_radius_order"))]
pub struct MatchRequest {
    #[validate(range(min = 0.0))]
    #[serde(default = "default_min_hail_size")]
    pub min_hail_size_in: f64,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_base_radius")]
    pub base_radius_mi: f64,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_radius_per_inch")]
    pub radius_per_inch_mi: f64,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_max_radius")]
    pub max_radius_mi: f64,
}

fn default_min_hail_size() -> f64 { 1.0 }
fn default_base_radius() -> f64 { 1.0 }
fn default_radius_per_inch() -> f64 { 1.0 }
fn default_max_radius() -> f64 { 5.0 }

fn validate_radius_order(req: &MatchRequest) -> Result<(), ValidationError> {
    if req.max_radius_mi < req.base_radius_mi {
        return Err(ValidationError::new("max_radius_below_base_radius"));
    }
    Ok(())
}

impl Default for MatchRequest {
    fn default() -> Self {
        Self {
            min_hail_size_in: default_min_hail_size(),
            base_radius_mi: default_base_radius(),
            radius_per_inch_mi: default_radius_per_inch(),
            max_radius_mi: default_max_radius(),
        }
    }
}

impl From<&MatchRequest> for MatchConfig {
    fn from(req: &MatchRequest) -> Self {
        Self {
            min_hail_size_in: req.min_hail_size_in,
            base_radius_mi: req.base_radius_mi,
            radius_per_inch_mi: req.radius_per_inch_mi,
            max_radius_mi: req.max_radius_mi,
        }
    }
}

/// Query string for the stats endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StatsQuery {
    /// `exact` or `sampled`
    #[serde(default)]
    pub mode: Option<String>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub sample_size: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StatsQuery {
    /// Resolve the requested mode against the configured sampling defaults
    pub fn estimate_mode(&self, defaults: SampleSpec) -> Result<EstimateMode, String> {
        match self.mode.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("exact") => Ok(EstimateMode::Exact),
            Some("sampled") => Ok(EstimateMode::Sampled(SampleSpec {
                size: self.sample_size.unwrap_or(defaults.size),
                seed: self.seed.unwrap_or(defaults.seed),
            })),
            Some(other) => Err(format!("mode must be one of: exact, sampled (got {})", other)),
        }
    }
}

/// Query string for paginated property listings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PropertiesQuery {
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_page_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub damaged_only: bool,
}

fn default_page_limit() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_request_defaults() {
        let req: MatchRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(MatchConfig::from(&req), MatchConfig::default());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_match_request_rejects_negative_radius() {
        let req = MatchRequest {
            base_radius_mi: -1.0,
            ..MatchRequest::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_match_request_rejects_inverted_radii() {
        let req = MatchRequest {
            base_radius_mi: 4.0,
            max_radius_mi: 2.0,
            ..MatchRequest::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_stats_mode_resolution() {
        let defaults = SampleSpec { size: 1000, seed: 42 };

        let exact = StatsQuery::default();
        assert_eq!(exact.estimate_mode(defaults), Ok(EstimateMode::Exact));

        let sampled = StatsQuery {
            mode: Some("Sampled".to_string()),
            sample_size: Some(50),
            seed: None,
        };
        assert_eq!(
            sampled.estimate_mode(defaults),
            Ok(EstimateMode::Sampled(SampleSpec { size: 50, seed: 42 }))
        );

        let bogus = StatsQuery {
            mode: Some("approximate".to_string()),
            ..StatsQuery::default()
        };
        assert!(bogus.estimate_mode(defaults).is_err());
    }
}
