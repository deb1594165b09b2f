use rand::{seq::index, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::{error::MatchError, filters::property_coordinates, matcher::Matcher};
use crate::models::{
    DamageSummary, EstimateKind, EstimateMode, MatchConfig, PropertyRecord, SampleSpec, StormEvent,
};

/// Estimate how many properties in the catalog were likely damaged
///
/// `Exact` matches every property. `Sampled` matches a reproducible random
/// sample of the properties with usable coordinates (drawn without
/// replacement, always against the full event catalog) and extrapolates the
/// damage rate over those properties. A sample at least as large as the
/// usable part of the catalog is an exact run.
pub fn estimate_damage(
    properties: &[PropertyRecord],
    events: &[StormEvent],
    config: &MatchConfig,
    mode: EstimateMode,
) -> Result<DamageSummary, MatchError> {
    let matcher = Matcher::new(config)?;

    let spec = match mode {
        EstimateMode::Sampled(spec) if spec.size == 0 => return Err(MatchError::EmptySample),
        EstimateMode::Sampled(spec) => spec,
        EstimateMode::Exact => return Ok(exact(&matcher, properties, events)),
    };

    let usable: Vec<&PropertyRecord> = properties
        .iter()
        .filter(|p| property_coordinates(p).is_some())
        .collect();
    if spec.size >= usable.len() {
        return Ok(exact(&matcher, properties, events));
    }

    let sample = draw_sample(&usable, spec);
    tracing::debug!(
        "Sampling {} of {} usable properties (seed {})",
        sample.len(),
        usable.len(),
        spec.seed
    );

    let run = matcher.run(&sample, events);
    let damaged = run.damaged_count();
    let damage_rate = rate(damaged, run.results.len());

    Ok(DamageSummary {
        mode: EstimateKind::Sampled,
        total_properties: properties.len(),
        sampled_properties: sample.len(),
        damaged,
        damage_rate,
        estimated_damaged: (usable.len() as f64 * damage_rate).floor() as usize,
        hail_events: events.len(),
        excluded_properties: properties.len() - usable.len(),
    })
}

fn exact(matcher: &Matcher, properties: &[PropertyRecord], events: &[StormEvent]) -> DamageSummary {
    let run = matcher.run(properties, events);
    let damaged = run.damaged_count();

    DamageSummary {
        mode: EstimateKind::Exact,
        total_properties: properties.len(),
        sampled_properties: properties.len(),
        damaged,
        damage_rate: rate(damaged, run.results.len()),
        estimated_damaged: damaged,
        hail_events: events.len(),
        excluded_properties: run.quality.excluded_properties.len(),
    }
}

/// Pick `spec.size` properties, keeping their catalog order
fn draw_sample(usable: &[&PropertyRecord], spec: SampleSpec) -> Vec<PropertyRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(spec.seed);
    let mut picked = index::sample(&mut rng, usable.len(), spec.size).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| usable[i].clone()).collect()
}

fn rate(damaged: usize, scored: usize) -> f64 {
    if scored > 0 {
        damaged as f64 / scored as f64
    } else {
        0.0
    }
}
