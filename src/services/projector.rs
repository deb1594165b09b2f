use std::cmp::Ordering;
use std::io::Write;
use std::string::FromUtf8Error;
use thiserror::Error;

use crate::core::MatchRun;
use crate::models::{MatchResult, PropertyRecord, ScoredProperty};

/// Errors that can occur while writing scored rows
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Join each match result with the property it was computed for
///
/// Results are re-joined by input position, so `properties` must be the
/// same slice the run was computed from. Rows come back in output order.
pub fn project(properties: &[PropertyRecord], run: &MatchRun) -> Vec<ScoredProperty> {
    let mut rows: Vec<ScoredProperty> = run
        .results
        .iter()
        .filter_map(|result| {
            let property = properties.get(result.property_index)?;
            Some(scored_row(property, result))
        })
        .collect();

    sort_for_output(&mut rows);
    rows
}

fn scored_row(property: &PropertyRecord, result: &MatchResult) -> ScoredProperty {
    let details = property.details.clone();
    ScoredProperty {
        property_address: details.property_address,
        city: details.city,
        county: details.county,
        postcode: details.postcode,
        prop_lat: property.latitude,
        prop_lon: property.longitude,
        owner_name: details.owner_name,
        owner_mailing_address: details.owner_mailing_address,
        property_type: details.property_type,
        year_built: details.year_built,
        appraisal_value: details.appraisal_value,
        account_number: property.account_number.clone(),
        data_source: details.data_source,
        lookup_url: details.lookup_url,
        nearest_event_id: result.nearest_event_id.as_ref().map(|id| id.to_string()),
        nearest_hail_miles: result.nearest_distance_mi,
        nearest_hail_size_in: result.nearest_hail_size_in,
        hail_damage_likely: result.hail_damage_likely,
        source_file: details.source_file,
    }
}

/// Damaged rows first, then nearest hail ascending, rows without a distance last
///
/// The sort is stable, so equal rows keep their input order.
pub fn sort_for_output(rows: &mut [ScoredProperty]) {
    rows.sort_by(|a, b| {
        b.hail_damage_likely
            .cmp(&a.hail_damage_likely)
            .then_with(|| compare_distance(a.nearest_hail_miles, b.nearest_hail_miles))
    });
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Select one page of rows, optionally only the likely-damaged ones
///
/// Returns the page and the number of rows it was drawn from.
pub fn page(
    rows: &[ScoredProperty],
    limit: usize,
    offset: usize,
    damaged_only: bool,
) -> (Vec<ScoredProperty>, usize) {
    let filtered: Vec<&ScoredProperty> = rows
        .iter()
        .filter(|row| !damaged_only || row.hail_damage_likely)
        .collect();
    let total = filtered.len();

    let page = filtered
        .into_iter()
        .skip(offset)
        .take(limit)
        .cloned()
        .collect();

    (page, total)
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write>(rows: &[ScoredProperty], writer: W) -> Result<(), ProjectionError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(rows: &[ScoredProperty]) -> Result<String, ProjectionError> {
    let mut buffer = Vec::new();
    write_csv(rows, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::match_properties;
    use crate::models::{MatchConfig, StormEvent};

    fn row(account: &str, damaged: bool, miles: Option<f64>) -> ScoredProperty {
        let mut property = PropertyRecord::new(account, 32.78, -96.80);
        property.details.source_file = Some("dallas.csv".to_string());
        let mut result = MatchResult::unmatched(0, account.to_string());
        result.hail_damage_likely = damaged;
        result.nearest_distance_mi = miles;
        scored_row(&property, &result)
    }

    fn accounts(rows: &[ScoredProperty]) -> Vec<&str> {
        rows.iter().map(|r| r.account_number.as_str()).collect()
    }

    #[test]
    fn test_output_order() {
        let mut rows = vec![
            row("far", false, Some(9.0)),
            row("none", false, None),
            row("hit-far", true, Some(2.0)),
            row("near", false, Some(6.0)),
            row("hit-near", true, Some(0.5)),
        ];

        sort_for_output(&mut rows);

        assert_eq!(accounts(&rows), vec!["hit-near", "hit-far", "near", "far", "none"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut rows = vec![
            row("b", false, Some(3.0)),
            row("a", false, Some(3.0)),
            row("c", false, None),
            row("d", false, None),
        ];

        sort_for_output(&mut rows);

        assert_eq!(accounts(&rows), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_project_rejoins_by_position() {
        let events = vec![StormEvent::new("7", 32.78, -96.80, 2.0)];
        let mut excluded = PropertyRecord::new("X", 32.78, -96.80);
        excluded.latitude = None;
        let mut hit = PropertyRecord::new("HIT", 32.78, -96.80);
        hit.details.owner_name = Some("Jane Doe".to_string());
        let properties = vec![
            PropertyRecord::new("MISS", 33.78, -96.80),
            excluded,
            hit,
        ];

        let run = match_properties(&properties, &events, &MatchConfig::default()).unwrap();
        let rows = project(&properties, &run);

        assert_eq!(accounts(&rows), vec!["HIT", "MISS"]);
        assert_eq!(rows[0].owner_name.as_deref(), Some("Jane Doe"));
        assert_eq!(rows[0].nearest_event_id.as_deref(), Some("7"));
        assert!(rows[0].hail_damage_likely);
        assert!(!rows[1].hail_damage_likely);
    }

    #[test]
    fn test_page() {
        let rows = vec![
            row("a", true, Some(1.0)),
            row("b", true, Some(2.0)),
            row("c", false, Some(8.0)),
        ];

        let (first, total) = page(&rows, 2, 0, false);
        assert_eq!(total, 3);
        assert_eq!(accounts(&first), vec!["a", "b"]);

        let (rest, _) = page(&rows, 2, 2, false);
        assert_eq!(accounts(&rest), vec!["c"]);

        let (damaged, total) = page(&rows, 10, 0, true);
        assert_eq!(total, 2);
        assert_eq!(accounts(&damaged), vec!["a", "b"]);

        let (empty, _) = page(&rows, 10, 50, false);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_csv_columns() {
        let csv = to_csv_string(&[row("R1", true, Some(1.5))]).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("property_address,city,COUNTY,postcode,prop_lat,prop_lon"));
        assert!(header.ends_with("hail_damage_likely,__source_file"));

        let record = lines.next().unwrap();
        assert!(record.contains(",R1,"));
        assert!(record.ends_with("true,dallas.csv"));
    }
}
