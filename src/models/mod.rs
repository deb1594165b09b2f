// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    DamageSummary, EstimateKind, EstimateMode, EventId, MatchConfig, MatchResult, MatchStatus,
    PropertyDetails, PropertyRecord, SampleSpec, ScoredProperty, StormEvent,
};
pub use requests::{MatchRequest, PropertiesQuery, StatsQuery};
pub use responses::{ErrorResponse, HealthResponse, MatchResponse, PropertiesResponse, StatsResponse};
