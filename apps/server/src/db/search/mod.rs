//! Package search: criteria parsing, filter construction and SQL rendering

pub mod builder;
pub mod destination;
pub mod params;
pub mod predicate;
pub mod query;
pub mod query_builder;
pub mod sort;
pub mod string_normalization;

pub use builder::{build_nearby_predicate, build_search_predicate};
pub use destination::{resolve_destination, DestinationCriteria};
pub use params::{NearbyCriteria, SearchCriteria};
pub use predicate::{Condition, Predicate};
pub use query::{PackageQuery, PricingLoad, Relations, Window};
pub use sort::{SortKey, SortOrder, SortSpec};
