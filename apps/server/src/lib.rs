//! Tourist package discovery and search
//!
//! An HTTP service answering "which packages match these criteria, near where, for
//! how much":
//! - Destination resolution across the city/region hierarchy and itinerary stops
//! - Relational filtering pushed to the package store as a typed predicate tree
//! - Geo proximity search with a bounding-box pre-filter and haversine distance
//! - Price and validity-window post-filtering with consistent pagination

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod request_context;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
