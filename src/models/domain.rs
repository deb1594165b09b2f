use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Storm event identifier
///
/// Identifiers are opaque strings, but they carry a total order used to break
/// distance ties: ids that parse as unsigned integers compare numerically and
/// sort before every non-numeric id; everything else compares lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for EventId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for EventId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// A recorded hail occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormEvent {
    pub id: EventId,
    pub latitude: f64,
    pub longitude: f64,
    /// Hail diameter in inches; `None` means the size was not reported
    #[serde(default)]
    pub hail_size_in: Option<f64>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
}

impl StormEvent {
    pub fn new(id: impl Into<EventId>, latitude: f64, longitude: f64, hail_size_in: f64) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            hail_size_in: Some(hail_size_in),
            event_date: None,
        }
    }

    /// Hail size with unknown sizes treated as zero
    pub fn hail_size(&self) -> f64 {
        self.hail_size_in.unwrap_or(0.0)
    }
}

/// Descriptive property attributes, carried through matching untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub property_address: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub postcode: Option<String>,
    pub owner_name: Option<String>,
    pub owner_mailing_address: Option<String>,
    pub property_type: Option<String>,
    pub year_built: Option<String>,
    pub appraisal_value: Option<String>,
    pub data_source: Option<String>,
    pub lookup_url: Option<String>,
    pub source_file: Option<String>,
}

/// A property from one of the appraisal-district lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub account_number: String,
    /// Missing when the source row had no usable coordinate
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub details: PropertyDetails,
}

impl PropertyRecord {
    pub fn new(account_number: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            account_number: account_number.into(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            details: PropertyDetails::default(),
        }
    }
}

/// Run-level matching parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub min_hail_size_in: f64,
    pub base_radius_mi: f64,
    pub radius_per_inch_mi: f64,
    pub max_radius_mi: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_hail_size_in: 1.0,
            base_radius_mi: 1.0,
            radius_per_inch_mi: 1.0,
            max_radius_mi: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// A qualifying event was found
    Matched,
    /// No event passed the hail-size threshold
    NoCandidate,
    /// Distance computation produced a non-finite value
    Failed,
}

/// Nearest-event verdict for one property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Position of the originating record in the input property sequence
    pub property_index: usize,
    pub property_id: String,
    pub nearest_event_id: Option<EventId>,
    pub nearest_distance_mi: Option<f64>,
    pub nearest_hail_size_in: Option<f64>,
    pub hail_damage_likely: bool,
    pub status: MatchStatus,
}

impl MatchResult {
    pub fn unmatched(property_index: usize, property_id: String) -> Self {
        Self {
            property_index,
            property_id,
            nearest_event_id: None,
            nearest_distance_mi: None,
            nearest_hail_size_in: None,
            hail_damage_likely: false,
            status: MatchStatus::NoCandidate,
        }
    }

    pub fn failed(property_index: usize, property_id: String) -> Self {
        Self {
            status: MatchStatus::Failed,
            ..Self::unmatched(property_index, property_id)
        }
    }
}

/// How a damage estimate is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateMode {
    /// Match every property
    Exact,
    /// Match a seeded random sample of properties and extrapolate
    Sampled(SampleSpec),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleSpec {
    pub size: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateKind {
    Exact,
    Sampled,
}

/// Catalog-level damage figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageSummary {
    pub mode: EstimateKind,
    pub total_properties: usize,
    /// Properties actually run through the matcher
    pub sampled_properties: usize,
    /// Damaged properties among the matched ones
    pub damaged: usize,
    pub damage_rate: f64,
    pub estimated_damaged: usize,
    pub hail_events: usize,
    pub excluded_properties: usize,
}

/// Output row: a property joined with its match verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProperty {
    pub property_address: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "COUNTY")]
    pub county: Option<String>,
    pub postcode: Option<String>,
    pub prop_lat: Option<f64>,
    pub prop_lon: Option<f64>,
    pub owner_name: Option<String>,
    pub owner_mailing_address: Option<String>,
    pub property_type: Option<String>,
    pub year_built: Option<String>,
    pub appraisal_value: Option<String>,
    pub account_number: String,
    pub data_source: Option<String>,
    pub lookup_url: Option<String>,
    pub nearest_event_id: Option<String>,
    pub nearest_hail_miles: Option<f64>,
    pub nearest_hail_size_in: Option<f64>,
    pub hail_damage_likely: bool,
    #[serde(rename = "__source_file")]
    pub source_file: Option<String>,
}
