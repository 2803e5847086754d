//! Database layer - package stores and query construction

pub mod memory;
pub mod search;
pub mod store;
pub mod traits;

pub use memory::{InMemoryPackageStore, PackageRecord};
pub use store::PostgresPackageStore;
pub use traits::PackageStore;
