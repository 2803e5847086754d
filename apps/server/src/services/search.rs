//! Search service - package discovery
//!
//! Orchestrates every search mode:
//! - Parsing and validating query items
//! - Building the store-level filter and running it
//! - Running the geo or price/validity stage in memory
//! - Paginating and assembling `{data, meta}`
//!
//! Whenever an in-memory stage runs, the store is queried without a window and
//! pagination happens afterwards, so `total` and `totalPages` always describe the
//! set the client pages through.

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::db::search::{
    build_nearby_predicate, build_search_predicate, NearbyCriteria, PackageQuery, PricingLoad,
    Relations, SearchCriteria, SortSpec, Window,
};
use crate::db::traits::PackageStore;
use crate::models::{GeoPoint, NearbyPackage, Package, SearchMeta, SearchResponse};
use crate::services::geo::{within_radius, BoundingBox};
use crate::services::paging::{total_pages, PageRequest};
use crate::services::pricing::{PostFilter, PriceFilter, ValidityFilter};
use crate::Result;

/// Metric label for each entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    General,
    ByCity,
    Nearby,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::General => "search",
            SearchMode::ByCity => "by_city",
            SearchMode::Nearby => "nearby",
        }
    }
}

pub struct SearchService {
    store: Arc<dyn PackageStore>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(store: Arc<dyn PackageStore>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn PackageStore> {
        &self.store
    }

    /// General search over query items.
    pub async fn search(&self, query_items: &[(String, String)]) -> Result<SearchResponse<Package>> {
        let result = match SearchCriteria::from_items(query_items, &self.config) {
            Ok(criteria) => self.search_criteria(criteria).await,
            Err(e) => Err(e),
        };
        record_outcome(SearchMode::General, &result);
        result
    }

    /// General search restricted to one city; the path id overrides any `cityId` item.
    pub async fn search_by_city(
        &self,
        city_id: i64,
        query_items: &[(String, String)],
    ) -> Result<SearchResponse<Package>> {
        let result = match SearchCriteria::from_items(query_items, &self.config) {
            Ok(mut criteria) => {
                criteria.city_id = Some(city_id);
                self.search_criteria(criteria).await
            }
            Err(e) => Err(e),
        };
        record_outcome(SearchMode::ByCity, &result);
        result
    }

    pub async fn nearby(
        &self,
        query_items: &[(String, String)],
    ) -> Result<SearchResponse<NearbyPackage>> {
        let result = match NearbyCriteria::from_items(query_items, &self.config) {
            Ok(criteria) => self.nearby_criteria(criteria).await,
            Err(e) => Err(e),
        };
        record_outcome(SearchMode::Nearby, &result);
        result
    }

    /// Run an already validated general search.
    #[tracing::instrument(
        name = "search.packages",
        skip_all,
        fields(page = criteria.page, limit = criteria.limit, post_filter = criteria.needs_post_filter())
    )]
    pub async fn search_criteria(&self, criteria: SearchCriteria) -> Result<SearchResponse<Package>> {
        let filter = build_search_predicate(&criteria);
        let page = PageRequest::new(criteria.page, criteria.limit);
        let post_filter = PostFilter {
            price: PriceFilter {
                min_price: criteria.min_price,
                max_price: criteria.max_price,
                currency_id: criteria.currency_id,
            },
            validity: ValidityFilter {
                start: criteria.start_date,
                end: criteria.end_date,
            },
        };

        let (data, total, total_results) = if post_filter.is_active() {
            let query = PackageQuery::new(filter)
                .include(Relations::listing(PricingLoad::AllActive))
                .sort(criteria.sort);
            let candidates = self.store.find_packages(&query).await?;
            let pre_filter_total = candidates.len() as u64;

            let (kept, dropped) = post_filter.apply(candidates);
            for (check, count) in dropped.by_check() {
                observe_dropped(check.as_str(), count);
            }
            tracing::debug!(
                candidates = pre_filter_total,
                kept = kept.len(),
                dropped_price = dropped.price,
                dropped_validity = dropped.validity,
                "Applied price/validity post-filter"
            );

            let total = kept.len() as u64;
            (page.slice(kept), total, Some(pre_filter_total))
        } else {
            let query = PackageQuery::new(filter.clone())
                .include(Relations::listing(PricingLoad::Cheapest))
                .sort(criteria.sort)
                .window(Some(Window {
                    skip: page.skip(),
                    take: page.take(),
                }));
            let (total, data) = futures::try_join!(
                self.store.count_packages(&filter),
                self.store.find_packages(&query)
            )?;
            (data, u64::try_from(total).unwrap_or(0), None)
        };

        tracing::debug!(total, returned = data.len(), "Package search completed");

        Ok(SearchResponse {
            data,
            meta: SearchMeta {
                total,
                total_results,
                page: page.page,
                limit: page.limit,
                total_pages: total_pages(total, page.limit),
                filters: Some(criteria.filters_echo()),
                center: None,
                radius_km: None,
            },
        })
    }

    /// Run an already validated nearby search.
    #[tracing::instrument(
        name = "search.nearby",
        skip_all,
        fields(lat = criteria.lat, lng = criteria.lng, radius_km = criteria.radius_km)
    )]
    pub async fn nearby_criteria(
        &self,
        criteria: NearbyCriteria,
    ) -> Result<SearchResponse<NearbyPackage>> {
        let bbox = BoundingBox::around(criteria.lat, criteria.lng, criteria.radius_km);
        let filter = build_nearby_predicate(&criteria, bbox);
        let page = PageRequest::new(criteria.page, criteria.limit);

        let query = PackageQuery::new(filter)
            .include(Relations::listing(PricingLoad::Cheapest))
            .sort(SortSpec::default());
        let candidates = self.store.find_packages(&query).await?;
        let candidate_count = candidates.len() as u64;

        let hits = within_radius(candidates, (criteria.lat, criteria.lng), criteria.radius_km);
        let total = hits.len() as u64;
        observe_dropped("geo", candidate_count - total);
        tracing::debug!(
            candidates = candidate_count,
            within_radius = total,
            "Applied geo proximity filter"
        );

        Ok(SearchResponse {
            data: page.slice(hits),
            meta: SearchMeta {
                total,
                total_results: Some(candidate_count),
                page: page.page,
                limit: page.limit,
                total_pages: total_pages(total, page.limit),
                filters: None,
                center: Some(GeoPoint {
                    lat: criteria.lat,
                    lng: criteria.lng,
                }),
                radius_km: Some(criteria.radius_km),
            },
        })
    }
}

fn observe_dropped(stage: &str, count: u64) {
    if count > 0 {
        crate::metrics::POST_FILTER_DROPPED_TOTAL
            .with_label_values(&[stage])
            .inc_by(count);
    }
}

fn record_outcome<T>(mode: SearchMode, result: &Result<SearchResponse<T>>) {
    let status = match result {
        Ok(response) => {
            crate::metrics::SEARCH_RESULTS
                .with_label_values(&[mode.as_str()])
                .observe(response.meta.total as f64);
            "success"
        }
        Err(e) if e.is_client_error() => "client_error",
        Err(e) => {
            tracing::warn!(mode = mode.as_str(), error = %e, "Package search failed");
            "server_error"
        }
    };
    crate::metrics::SEARCH_REQUESTS_TOTAL
        .with_label_values(&[mode.as_str(), status])
        .inc();
}
