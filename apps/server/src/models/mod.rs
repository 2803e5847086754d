//! Domain models for the package catalog

pub mod package;
pub mod response;

pub use package::{
    City, CompanySummary, Difficulty, MediaItem, NearbyPackage, Package, PackageLocation,
    PackageType, PricingOption, Region,
};
pub use response::{GeoPoint, SearchMeta, SearchResponse};
