// Unit tests for Hail Match

use hail_match::core::{
    distance::{haversine_miles, EARTH_RADIUS_MI},
    filters::{has_valid_coordinates, is_valid_event, property_coordinates},
    index::{nearest_exhaustive, CandidateSet, EventGrid},
    MatchError, RadiusPolicy,
};
use hail_match::models::{
    EstimateMode, EventId, MatchConfig, MatchRequest, PropertiesQuery, PropertyRecord, SampleSpec,
    StatsQuery, StormEvent,
};
use validator::Validate;

/// Degrees of latitude spanning the given distance along a meridian
fn miles_north(miles: f64) -> f64 {
    (miles / EARTH_RADIUS_MI).to_degrees()
}

#[test]
fn test_haversine_distance_zero() {
    assert_eq!(haversine_miles(32.78, -96.80, 32.78, -96.80), 0.0);
}

#[test]
fn test_haversine_distance_dallas_to_houston() {
    // Dallas to Houston is roughly 225 miles
    let distance = haversine_miles(32.7767, -96.7970, 29.7604, -95.3698);
    assert!(distance > 215.0 && distance < 235.0, "got {}", distance);
}

#[test]
fn test_haversine_distance_symmetric() {
    let there = haversine_miles(32.78, -96.80, 35.47, -97.52);
    let back = haversine_miles(35.47, -97.52, 32.78, -96.80);
    assert_eq!(there, back);
}

#[test]
fn test_meridian_distance_is_exact() {
    let distance = haversine_miles(32.78, -96.80, 32.78 + miles_north(3.0), -96.80);
    assert!((distance - 3.0).abs() < 1e-9);
}

#[test]
fn test_radius_formula() {
    let policy = RadiusPolicy::new(&MatchConfig::default()).unwrap();

    assert_eq!(policy.radius_mi(0.0), 1.0);
    assert_eq!(policy.radius_mi(2.0), 3.0);
    // Capped at max_radius_mi
    assert_eq!(policy.radius_mi(4.0), 5.0);
    assert_eq!(policy.radius_mi(10.0), 5.0);
}

#[test]
fn test_threshold_is_inclusive() {
    let policy = RadiusPolicy::new(&MatchConfig::default()).unwrap();
    assert!(policy.qualifies(1.0));
    assert!(!policy.qualifies(0.99));
}

#[test]
fn test_config_validation() {
    assert!(MatchConfig::default().validate().is_ok());

    let negative = MatchConfig {
        min_hail_size_in: -0.5,
        ..MatchConfig::default()
    };
    assert!(matches!(
        negative.validate(),
        Err(MatchError::NegativeParameter { field: "min_hail_size_in", .. })
    ));

    let inverted = MatchConfig {
        base_radius_mi: 6.0,
        max_radius_mi: 5.0,
        ..MatchConfig::default()
    };
    assert_eq!(
        inverted.validate(),
        Err(MatchError::RadiusOrder { base: 6.0, max: 5.0 })
    );

    let non_finite = MatchConfig {
        radius_per_inch_mi: f64::NAN,
        ..MatchConfig::default()
    };
    assert!(non_finite.validate().is_err());
}

#[test]
fn test_coordinate_filters() {
    assert!(has_valid_coordinates(32.78, -96.80));
    assert!(!has_valid_coordinates(999.0, -96.80));

    let mut property = PropertyRecord::new("R1", 32.78, -96.80);
    assert!(property_coordinates(&property).is_some());
    property.latitude = Some(f64::NAN);
    assert!(property_coordinates(&property).is_none());

    let mut event = StormEvent::new("1", 32.78, -96.80, 1.0);
    assert!(is_valid_event(&event));
    event.hail_size_in = Some(-1.0);
    assert!(!is_valid_event(&event));
    event.hail_size_in = None;
    assert!(is_valid_event(&event));
}

#[test]
fn test_event_id_ordering() {
    let mut ids: Vec<EventId> = ["20", "b", "10", "a", "9"].into_iter().map(EventId::from).collect();
    ids.sort();
    let sorted: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
    assert_eq!(sorted, vec!["9", "10", "20", "a", "b"]);
}

#[test]
fn test_candidate_set_screening() {
    let policy = RadiusPolicy::new(&MatchConfig::default()).unwrap();
    let events = vec![
        StormEvent::new("3", 32.78, -96.80, 2.0),
        StormEvent::new("1", 32.80, -96.80, 0.5),
        StormEvent::new("2", 95.00, -96.80, 3.0),
        StormEvent::new("4", 32.90, -96.80, 1.0),
    ];

    let set = CandidateSet::build(&events, &policy);

    assert_eq!(set.len(), 2);
    assert_eq!(set.below_threshold, 1);
    assert_eq!(set.rejected, vec![EventId::from("2")]);
    let radii: Vec<f64> = set.candidates.iter().map(|c| c.radius_mi).collect();
    assert!(radii.contains(&3.0) && radii.contains(&2.0));
}

#[test]
fn test_grid_agrees_with_scan() {
    let policy = RadiusPolicy::new(&MatchConfig::default()).unwrap();
    let events: Vec<StormEvent> = (0..60)
        .map(|i| {
            StormEvent::new(
                i as u64,
                25.0 + (i % 10) as f64 * 1.3,
                -105.0 + (i / 10) as f64 * 2.7,
                1.0 + (i % 4) as f64 * 0.5,
            )
        })
        .collect();
    let set = CandidateSet::build(&events, &policy);
    let grid = EventGrid::build(&set.candidates);

    for step in 0..50 {
        let lat = 20.0 + step as f64 * 0.43;
        let lon = -110.0 + step as f64 * 0.61;
        let indexed = grid.nearest(lat, lon).unwrap().unwrap();
        let naive = nearest_exhaustive(&set.candidates, lat, lon).unwrap().unwrap();
        assert_eq!(indexed, naive, "query ({}, {})", lat, lon);
    }
}

#[test]
fn test_match_request_validation() {
    let valid: MatchRequest =
        serde_json::from_str(r#"{"min_hail_size_in": 1.5, "max_radius_mi": 8.0}"#).unwrap();
    assert!(valid.validate().is_ok());
    assert_eq!(MatchConfig::from(&valid).min_hail_size_in, 1.5);
    assert_eq!(MatchConfig::from(&valid).base_radius_mi, 1.0);

    let inverted: MatchRequest =
        serde_json::from_str(r#"{"base_radius_mi": 3.0, "max_radius_mi": 2.0}"#).unwrap();
    assert!(inverted.validate().is_err());
}

#[test]
fn test_stats_query_modes() {
    let defaults = SampleSpec { size: 1000, seed: 42 };

    assert_eq!(StatsQuery::default().estimate_mode(defaults), Ok(EstimateMode::Exact));

    let sampled = StatsQuery {
        mode: Some("sampled".to_string()),
        sample_size: Some(50),
        seed: None,
    };
    assert_eq!(
        sampled.estimate_mode(defaults),
        Ok(EstimateMode::Sampled(SampleSpec { size: 50, seed: 42 }))
    );

    let unknown = StatsQuery {
        mode: Some("fast".to_string()),
        ..StatsQuery::default()
    };
    assert!(unknown.estimate_mode(defaults).is_err());
}

#[test]
fn test_properties_query_limits() {
    let query: PropertiesQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(query.limit, 100);
    assert!(query.validate().is_ok());

    let too_big = PropertiesQuery {
        limit: 5000,
        ..query
    };
    assert!(too_big.validate().is_err());
}
