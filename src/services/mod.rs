// Service exports
pub mod cache;
pub mod catalog;
pub mod projector;

pub use cache::{CacheKey, RunCache, ScoredRun};
pub use catalog::{load_events, load_properties, Catalog, CatalogError, CatalogSnapshot, LoadReport};
pub use projector::{page, project, sort_for_output, to_csv_string, write_csv, ProjectionError};
