//! Storage seam for package search

use crate::{
    db::search::{PackageQuery, Predicate},
    models::Package,
    Result,
};
use async_trait::async_trait;

/// Read-only package catalog.
///
/// Implementations evaluate the typed filter tree however suits the backend and
/// hydrate the relations named in `PackageQuery::include`. Results honor the query's
/// sort and, when present, its window.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Packages matching `query.filter`, ordered and windowed.
    async fn find_packages(&self, query: &PackageQuery) -> Result<Vec<Package>>;

    /// Number of packages matching `filter`, ignoring any window.
    async fn count_packages(&self, filter: &Predicate) -> Result<i64>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
