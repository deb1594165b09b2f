use std::time::Instant;

use rayon::prelude::*;

use crate::core::{
    error::MatchError,
    filters::property_coordinates,
    index::{nearest_exhaustive, CandidateSet, EventGrid},
    radius::RadiusPolicy,
};
use crate::models::{EventId, MatchConfig, MatchResult, MatchStatus, PropertyRecord, StormEvent};

/// Records the matcher could not score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataQualityReport {
    /// Properties left out of the results for missing or out-of-range coordinates
    pub excluded_properties: Vec<String>,
    /// Events ignored for invalid coordinates or hail size
    pub excluded_events: Vec<EventId>,
    /// Properties whose distance computation failed
    pub failed_properties: Vec<String>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.excluded_properties.is_empty()
            && self.excluded_events.is_empty()
            && self.failed_properties.is_empty()
    }
}

/// Result of one matching run
#[derive(Debug, Clone)]
pub struct MatchRun {
    /// One entry per property with usable coordinates, in input order
    pub results: Vec<MatchResult>,
    pub quality: DataQualityReport,
    /// Events that passed validation and the hail-size threshold
    pub candidate_events: usize,
    /// Valid events smaller than the hail-size threshold
    pub below_threshold_events: usize,
}

impl MatchRun {
    pub fn damaged_count(&self) -> usize {
        self.results.iter().filter(|r| r.hail_damage_likely).count()
    }
}

/// How nearest events are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Bucket grid over event coordinates
    #[default]
    Indexed,
    /// Compare every property with every event
    Exhaustive,
}

/// Nearest-event matcher for a fixed radius policy
///
/// # Pipeline Stages
/// 1. Event screening (validity, hail-size threshold, id ranking)
/// 2. Spatial index construction
/// 3. Parallel nearest-event lookup per property
/// 4. Damage verdict against the nearest event's own coverage radius
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    policy: RadiusPolicy,
    strategy: SearchStrategy,
}

impl Matcher {
    /// Validate the configuration and build a matcher
    pub fn new(config: &MatchConfig) -> Result<Self, MatchError> {
        Ok(Self {
            policy: RadiusPolicy::new(config)?,
            strategy: SearchStrategy::default(),
        })
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn policy(&self) -> &RadiusPolicy {
        &self.policy
    }

    /// Match every property against the event catalog
    ///
    /// # Arguments
    /// * `properties` - The property catalog
    /// * `events` - The storm event catalog
    ///
    /// # Returns
    /// MatchRun with one result per property that has usable coordinates
    pub fn run(&self, properties: &[PropertyRecord], events: &[StormEvent]) -> MatchRun {
        let started = Instant::now();

        let set = CandidateSet::build(events, &self.policy);
        let grid = match self.strategy {
            SearchStrategy::Indexed => Some(EventGrid::build(&set.candidates)),
            SearchStrategy::Exhaustive => None,
        };

        let scored: Vec<Option<MatchResult>> = properties
            .par_iter()
            .enumerate()
            .map(|(index, property)| self.score(index, property, &set, grid.as_ref()))
            .collect();

        for id in &set.rejected {
            tracing::debug!("Excluding event {}: invalid coordinates or hail size", id);
        }

        let mut results = Vec::with_capacity(scored.len());
        let mut quality = DataQualityReport {
            excluded_events: set.rejected.clone(),
            ..DataQualityReport::default()
        };

        for (property, outcome) in properties.iter().zip(scored) {
            match outcome {
                Some(result) => {
                    if result.status == MatchStatus::Failed {
                        quality.failed_properties.push(result.property_id.clone());
                    }
                    results.push(result);
                }
                None => {
                    tracing::debug!(
                        "Excluding property {}: coordinates ({:?}, {:?}) unusable",
                        property.account_number,
                        property.latitude,
                        property.longitude
                    );
                    quality.excluded_properties.push(property.account_number.clone());
                }
            }
        }

        if !quality.is_clean() {
            tracing::warn!(
                "Data quality: {} properties excluded, {} events excluded, {} properties failed",
                quality.excluded_properties.len(),
                quality.excluded_events.len(),
                quality.failed_properties.len()
            );
        }

        let run = MatchRun {
            results,
            quality,
            candidate_events: set.len(),
            below_threshold_events: set.below_threshold,
        };

        tracing::info!(
            "Matched {} properties against {} qualifying events ({} below {:.2}in): {} likely damaged in {}ms",
            run.results.len(),
            run.candidate_events,
            run.below_threshold_events,
            self.policy.min_hail_size_in(),
            run.damaged_count(),
            started.elapsed().as_millis()
        );

        run
    }

    /// Score one property; `None` when its coordinates are unusable
    fn score(
        &self,
        index: usize,
        property: &PropertyRecord,
        set: &CandidateSet,
        grid: Option<&EventGrid<'_>>,
    ) -> Option<MatchResult> {
        let (lat, lon) = property_coordinates(property)?;
        let property_id = property.account_number.clone();

        let nearest = match grid {
            Some(grid) => grid.nearest(lat, lon),
            None => nearest_exhaustive(&set.candidates, lat, lon),
        };

        let result = match nearest {
            Ok(Some(nearest)) => {
                let candidate = &set.candidates[nearest.candidate];
                MatchResult {
                    property_index: index,
                    property_id,
                    nearest_event_id: Some(candidate.id.clone()),
                    nearest_distance_mi: Some(nearest.distance_mi),
                    nearest_hail_size_in: Some(candidate.hail_size_in),
                    hail_damage_likely: nearest.distance_mi <= candidate.radius_mi,
                    status: MatchStatus::Matched,
                }
            }
            Ok(None) => MatchResult::unmatched(index, property_id),
            Err(fault) => {
                tracing::error!("Property {}: {}", property.account_number, fault);
                MatchResult::failed(index, property_id)
            }
        };

        Some(result)
    }
}

/// Match properties against events
///
/// The single entry point of the core: validates `config`, then returns one
/// result per property with usable coordinates, in input order.
pub fn match_properties(
    properties: &[PropertyRecord],
    events: &[StormEvent],
    config: &MatchConfig,
) -> Result<MatchRun, MatchError> {
    Ok(Matcher::new(config)?.run(properties, events))
}
