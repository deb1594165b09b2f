// Core algorithm exports
pub mod distance;
pub mod error;
pub mod estimate;
pub mod filters;
pub mod index;
pub mod matcher;
pub mod radius;

pub use distance::{haversine_miles, EARTH_RADIUS_MI};
pub use error::{MatchError, NumericFault};
pub use estimate::estimate_damage;
pub use filters::{has_valid_coordinates, is_valid_event, property_coordinates};
pub use index::{nearest_exhaustive, Candidate, CandidateSet, EventGrid, Nearest, TIE_TOLERANCE_MI};
pub use matcher::{match_properties, DataQualityReport, MatchRun, Matcher, SearchStrategy};
pub use radius::RadiusPolicy;
