use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::filters::is_valid_event;
use crate::models::{EventId, PropertyDetails, PropertyRecord, StormEvent};

/// Errors that can occur while loading catalogs
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Catalog {path} has no {column} column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Catalog {path} has more than one {column} column: {headers:?}")]
    DuplicateColumn {
        path: PathBuf,
        column: &'static str,
        headers: Vec<String>,
    },

    #[error("No property catalogs configured")]
    NoSources,
}

/// Records read from one or more files, plus the rows that were rejected
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    pub records: Vec<T>,
    pub rejected_rows: usize,
}

/// Accepted spellings of one coordinate column
///
/// Each list must match the serde aliases of the row type it guards.
struct ColumnNames {
    column: &'static str,
    headers: &'static [&'static str],
}

const EVENT_LATITUDE: ColumnNames = ColumnNames {
    column: "latitude",
    headers: &["latitude", "lat", "LAT"],
};
const EVENT_LONGITUDE: ColumnNames = ColumnNames {
    column: "longitude",
    headers: &["longitude", "lon", "LON"],
};
const PROPERTY_LATITUDE: ColumnNames = ColumnNames {
    column: "latitude",
    headers: &["latitude", "prop_lat", "lat", "LAT"],
};
const PROPERTY_LONGITUDE: ColumnNames = ColumnNames {
    column: "longitude",
    headers: &["longitude", "prop_lon", "lon", "LON"],
};

#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(default, alias = "event_id", alias = "EVENT_ID")]
    id: Option<String>,
    #[serde(default, alias = "lat", alias = "LAT", deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "LON", deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
    #[serde(default, alias = "size", alias = "hail_size", deserialize_with = "csv::invalid_option")]
    hail_size_in: Option<f64>,
    #[serde(default, alias = "date", deserialize_with = "csv::invalid_option")]
    event_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PropertyRow {
    #[serde(default, alias = "ACCOUNT_NUMBER", alias = "account")]
    account_number: Option<String>,
    #[serde(
        default,
        alias = "prop_lat",
        alias = "lat",
        alias = "LAT",
        deserialize_with = "csv::invalid_option"
    )]
    latitude: Option<f64>,
    #[serde(
        default,
        alias = "prop_lon",
        alias = "lon",
        alias = "LON",
        deserialize_with = "csv::invalid_option"
    )]
    longitude: Option<f64>,
    #[serde(default)]
    property_address: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default, alias = "COUNTY")]
    county: Option<String>,
    #[serde(default)]
    postcode: Option<String>,
    #[serde(default)]
    owner_name: Option<String>,
    #[serde(default)]
    owner_mailing_address: Option<String>,
    #[serde(default)]
    property_type: Option<String>,
    #[serde(default)]
    year_built: Option<String>,
    #[serde(default)]
    appraisal_value: Option<String>,
    #[serde(default)]
    data_source: Option<String>,
    #[serde(default)]
    lookup_url: Option<String>,
}

/// Load storm events from a CSV file
///
/// Events with missing or out-of-range coordinates, or a negative hail size,
/// are rejected here and counted. Events without an `id` column value get
/// their 1-based row number as id.
pub fn load_events<P: AsRef<Path>>(path: P) -> Result<Catalog<StormEvent>, CatalogError> {
    let path = path.as_ref();
    let mut reader = open_reader(path, &EVENT_LATITUDE, &EVENT_LONGITUDE)?;

    let mut records = Vec::new();
    let mut rejected_rows = 0;

    for (row, parsed) in reader.deserialize::<EventRow>().enumerate() {
        let line = row + 1;
        let raw = match parsed {
            Ok(raw) => raw,
            Err(e) if e.is_io_error() => {
                return Err(CatalogError::Csv { path: path.to_path_buf(), source: e });
            }
            Err(e) => {
                tracing::warn!("{}: skipping event row {}: {}", path.display(), line, e);
                rejected_rows += 1;
                continue;
            }
        };

        let (Some(latitude), Some(longitude)) = (raw.latitude, raw.longitude) else {
            tracing::warn!("{}: skipping event row {}: missing coordinates", path.display(), line);
            rejected_rows += 1;
            continue;
        };

        let event = StormEvent {
            id: raw.id.map(EventId::from).unwrap_or_else(|| EventId::from(line as u64)),
            latitude,
            longitude,
            hail_size_in: raw.hail_size_in,
            event_date: raw.event_date,
        };

        if !is_valid_event(&event) {
            tracing::warn!(
                "{}: skipping event {}: invalid coordinates ({}, {}) or hail size {:?}",
                path.display(),
                event.id,
                event.latitude,
                event.longitude,
                event.hail_size_in
            );
            rejected_rows += 1;
            continue;
        }

        records.push(event);
    }

    tracing::info!(
        "Loaded {} hail events from {} ({} rows rejected)",
        records.len(),
        path.display(),
        rejected_rows
    );

    Ok(Catalog { records, rejected_rows })
}

/// Load property lookups from one or more CSV files
///
/// Unparseable or missing coordinates are kept as `None`; the matcher
/// excludes those properties and reports them. Rows that cannot be read at
/// all are rejected and counted.
pub fn load_properties<P: AsRef<Path>>(paths: &[P]) -> Result<Catalog<PropertyRecord>, CatalogError> {
    if paths.is_empty() {
        return Err(CatalogError::NoSources);
    }

    let mut records = Vec::new();
    let mut rejected_rows = 0;

    for path in paths {
        let path = path.as_ref();
        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut reader = open_reader(path, &PROPERTY_LATITUDE, &PROPERTY_LONGITUDE)?;
        let before = records.len();

        for (row, parsed) in reader.deserialize::<PropertyRow>().enumerate() {
            let line = row + 1;
            let raw = match parsed {
                Ok(raw) => raw,
                Err(e) if e.is_io_error() => {
                    return Err(CatalogError::Csv { path: path.to_path_buf(), source: e });
                }
                Err(e) => {
                    tracing::warn!("{}: skipping property row {}: {}", path.display(), line, e);
                    rejected_rows += 1;
                    continue;
                }
            };

            records.push(PropertyRecord {
                account_number: raw
                    .account_number
                    .unwrap_or_else(|| format!("{}:{}", source_file, line)),
                latitude: raw.latitude,
                longitude: raw.longitude,
                details: PropertyDetails {
                    property_address: raw.property_address,
                    city: raw.city,
                    county: raw.county,
                    postcode: raw.postcode,
                    owner_name: raw.owner_name,
                    owner_mailing_address: raw.owner_mailing_address,
                    property_type: raw.property_type,
                    year_built: raw.year_built,
                    appraisal_value: raw.appraisal_value,
                    data_source: raw.data_source,
                    lookup_url: raw.lookup_url,
                    source_file: Some(source_file.clone()),
                },
            });
        }

        tracing::info!("Loaded {} properties from {}", records.len() - before, path.display());
    }

    Ok(Catalog { records, rejected_rows })
}

/// Rows rejected while loading each catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rejected_events: usize,
    pub rejected_properties: usize,
}

/// Both catalogs, loaded once and shared read-only between requests
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub events: Vec<StormEvent>,
    pub properties: Vec<PropertyRecord>,
    pub report: LoadReport,
}

impl CatalogSnapshot {
    pub fn new(events: Vec<StormEvent>, properties: Vec<PropertyRecord>) -> Self {
        Self {
            events,
            properties,
            report: LoadReport::default(),
        }
    }

    /// Load the event catalog and every property lookup file
    pub fn load<P: AsRef<Path>>(events_path: P, property_paths: &[P]) -> Result<Self, CatalogError> {
        let events = load_events(events_path)?;
        let properties = load_properties(property_paths)?;

        let report = LoadReport {
            rejected_events: events.rejected_rows,
            rejected_properties: properties.rejected_rows,
        };
        if report != LoadReport::default() {
            tracing::warn!(
                "Catalog load rejected {} event rows and {} property rows",
                report.rejected_events,
                report.rejected_properties
            );
        }

        Ok(Self {
            events: events.records,
            properties: properties.records,
            report,
        })
    }
}

fn open_reader(
    path: &Path,
    latitude: &ColumnNames,
    longitude: &ColumnNames,
) -> Result<csv::Reader<File>, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(|source| CatalogError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    require_column(path, headers, latitude)?;
    require_column(path, headers, longitude)?;

    Ok(reader)
}

/// Exactly one spelling of the column must be present
fn require_column(
    path: &Path,
    headers: &csv::StringRecord,
    names: &ColumnNames,
) -> Result<(), CatalogError> {
    let found: Vec<String> = headers
        .iter()
        .filter(|h| names.headers.contains(h))
        .map(str::to_string)
        .collect();

    match found.len() {
        0 => Err(CatalogError::MissingColumn {
            path: path.to_path_buf(),
            column: names.column,
        }),
        1 => Ok(()),
        _ => Err(CatalogError::DuplicateColumn {
            path: path.to_path_buf(),
            column: names.column,
            headers: found,
        }),
    }
}
