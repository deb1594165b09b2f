//! Hail Match - hail damage matching engine
//!
//! Joins a catalog of storm events with a catalog of property records and
//! flags every property that lies within the coverage radius of its nearest
//! qualifying hail event. The core matcher is a pure function of its two
//! catalogs and a configuration; loaders, the result projector, the run cache
//! and the HTTP surface are layered around it.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{estimate_damage, haversine_miles, match_properties, MatchError, MatchRun, Matcher, SearchStrategy};
pub use crate::models::{
    DamageSummary, EstimateMode, EventId, MatchConfig, MatchResult, MatchStatus, PropertyRecord,
    SampleSpec, ScoredProperty, StormEvent,
};
