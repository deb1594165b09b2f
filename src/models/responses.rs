use serde::{Deserialize, Serialize};
use crate::models::domain::{DamageSummary, ScoredProperty};

/// Response for the match endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub success: bool,
    pub message: String,
    pub run_id: String,
    pub total_properties: usize,
    pub damaged_properties: usize,
    pub hail_events: usize,
    pub candidate_events: usize,
    pub excluded_properties: usize,
    pub excluded_events: usize,
    pub failed_properties: usize,
}

/// Response for the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub summary: DamageSummary,
    pub damage_percentage: f64,
}

impl From<DamageSummary> for StatsResponse {
    fn from(summary: DamageSummary) -> Self {
        let damage_percentage = (summary.damage_rate * 10_000.0).round() / 100.0;
        Self {
            summary,
            damage_percentage,
        }
    }
}

/// One page of scored properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesResponse {
    pub run_id: String,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub properties: Vec<ScoredProperty>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub hail_events: usize,
    pub properties: usize,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
