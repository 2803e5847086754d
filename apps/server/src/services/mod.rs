//! Service layer - search orchestration and in-memory stages

pub mod geo;
pub mod paging;
pub mod pricing;
pub mod search;

pub use search::{SearchMode, SearchService};
