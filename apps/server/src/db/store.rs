//! PostgreSQL package store

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::time::Instant;

use crate::db::search::query_builder::{
    self, BindValue, ACTIVE_PRICING_SQL, CHEAPEST_PRICING_SQL, CITIES_SQL, COMPANIES_SQL,
    LOCATIONS_SQL, PRIMARY_MEDIA_SQL,
};
use crate::db::search::{PackageQuery, Predicate, PricingLoad};
use crate::db::traits::PackageStore;
use crate::models::{
    City, CompanySummary, MediaItem, Package, PackageLocation, PricingOption, Region,
};
use crate::{Error, Result};

#[derive(Clone)]
pub struct PostgresPackageStore {
    pool: PgPool,
}

impl PostgresPackageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(
        &self,
        query_type: &str,
        sql: &str,
        binds: Vec<BindValue>,
    ) -> Result<Vec<PgRow>> {
        let mut query = sqlx::query(sql);
        for value in binds {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
                BindValue::Float(v) => query.bind(v),
                BindValue::Bool(v) => query.bind(v),
            };
        }
        timed(query_type, query.fetch_all(&self.pool)).await
    }

    async fn fetch_by_ids(&self, query_type: &str, sql: &str, ids: &[i64]) -> Result<Vec<PgRow>> {
        timed(query_type, sqlx::query(sql).bind(ids).fetch_all(&self.pool)).await
    }

    async fn attach_relations(&self, packages: &mut [Package], query: &PackageQuery) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = packages.iter().map(|p| p.id).collect();
        let include = query.include;

        let mut companies = HashMap::new();
        if include.company {
            for row in self.fetch_by_ids("load_companies", COMPANIES_SQL, &ids).await? {
                companies.insert(
                    row.try_get::<i64, _>("package_id")?,
                    CompanySummary {
                        id: row.try_get("id")?,
                        name: row.try_get("name")?,
                        logo_url: row.try_get("logo_url")?,
                    },
                );
            }
        }

        let mut pricing: HashMap<i64, Vec<PricingOption>> = HashMap::new();
        let pricing_sql = match include.pricing {
            PricingLoad::None => None,
            PricingLoad::Cheapest => Some(CHEAPEST_PRICING_SQL),
            PricingLoad::AllActive => Some(ACTIVE_PRICING_SQL),
        };
        if let Some(sql) = pricing_sql {
            for row in self.fetch_by_ids("load_pricing", sql, &ids).await? {
                let option = pricing_from_row(&row)?;
                pricing.entry(option.package_id).or_default().push(option);
            }
        }

        let mut media = HashMap::new();
        if include.primary_media {
            for row in self.fetch_by_ids("load_media", PRIMARY_MEDIA_SQL, &ids).await? {
                media.insert(
                    row.try_get::<i64, _>("package_id")?,
                    MediaItem {
                        id: row.try_get("id")?,
                        url: row.try_get("url")?,
                        media_type: row.try_get("media_type")?,
                        is_primary: row.try_get("is_primary")?,
                        sort_order: row.try_get("sort_order")?,
                    },
                );
            }
        }

        let mut cities = HashMap::new();
        if include.city {
            for row in self.fetch_by_ids("load_cities", CITIES_SQL, &ids).await? {
                cities.insert(row.try_get::<i64, _>("package_id")?, city_from_row(&row)?);
            }
        }

        let mut locations: HashMap<i64, Vec<PackageLocation>> = HashMap::new();
        if include.locations {
            for row in self.fetch_by_ids("load_locations", LOCATIONS_SQL, &ids).await? {
                locations
                    .entry(row.try_get("package_id")?)
                    .or_default()
                    .push(PackageLocation {
                        city: city_from_row(&row)?,
                        order: row.try_get("sort_order")?,
                        notes: row.try_get("notes")?,
                    });
            }
        }

        for package in packages.iter_mut() {
            package.company = companies.remove(&package.id);
            package.pricing_options = pricing.remove(&package.id).unwrap_or_default();
            package.primary_media = media.remove(&package.id);
            package.city = cities.remove(&package.id);
            package.locations = locations.remove(&package.id).unwrap_or_default();
        }
        Ok(())
    }
}

#[async_trait]
impl PackageStore for PostgresPackageStore {
    #[tracing::instrument(
        name = "store.find_packages",
        skip_all,
        fields(windowed = query.window.is_some())
    )]
    async fn find_packages(&self, query: &PackageQuery) -> Result<Vec<Package>> {
        let (sql, binds) = query_builder::build_select_sql(query);
        tracing::debug!(sql = %sql, binds = binds.len(), "Executing package query");

        let rows = self.fetch_rows("find_packages", &sql, binds).await?;
        let mut packages = rows
            .iter()
            .map(package_from_row)
            .collect::<Result<Vec<_>>>()?;

        self.attach_relations(&mut packages, query).await?;
        Ok(packages)
    }

    #[tracing::instrument(name = "store.count_packages", skip_all)]
    async fn count_packages(&self, filter: &Predicate) -> Result<i64> {
        let (sql, binds) = query_builder::build_count_sql(filter);

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for value in binds {
            query = match value {
                BindValue::Text(v) => query.bind(v),
                BindValue::Int(v) => query.bind(v),
                BindValue::Float(v) => query.bind(v),
                BindValue::Bool(v) => query.bind(v),
            };
        }
        timed("count_packages", query.fetch_one(&self.pool)).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

async fn timed<T>(
    query_type: &str,
    fut: impl std::future::Future<Output = std::result::Result<T, sqlx::Error>>,
) -> Result<T> {
    let start = Instant::now();
    let result = fut.await;
    crate::metrics::DB_QUERY_DURATION_SECONDS
        .with_label_values(&[query_type])
        .observe(start.elapsed().as_secs_f64());

    result.map_err(|e| {
        crate::metrics::DB_QUERY_ERRORS_TOTAL
            .with_label_values(&[query_type])
            .inc();
        tracing::warn!(query_type, error = %e, "Package store query failed");
        Error::Database(e)
    })
}

fn package_from_row(row: &PgRow) -> Result<Package> {
    let package_type: String = row.try_get("package_type")?;
    let difficulty: String = row.try_get("difficulty")?;

    Ok(Package {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        package_type: package_type.parse().map_err(Error::Internal)?,
        difficulty: difficulty.parse().map_err(Error::Internal)?,
        is_active: row.try_get("is_active")?,
        rating: row.try_get("rating")?,
        min_age: row.try_get("min_age")?,
        max_age: row.try_get("max_age")?,
        min_participants: row.try_get("min_participants")?,
        max_participants: row.try_get("max_participants")?,
        meeting_point_lat: row.try_get("meeting_point_lat")?,
        meeting_point_lng: row.try_get("meeting_point_lng")?,
        city_id: row.try_get("city_id")?,
        duration: row.try_get("duration")?,
        included_items: row.try_get("included_items")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        company: None,
        pricing_options: Vec::new(),
        primary_media: None,
        city: None,
        locations: Vec::new(),
    })
}

fn pricing_from_row(row: &PgRow) -> Result<PricingOption> {
    Ok(PricingOption {
        id: row.try_get("id")?,
        package_id: row.try_get("package_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        currency_id: row.try_get("currency_id")?,
        currency_code: row.try_get("currency_code")?,
        amount: row.try_get("amount")?,
        per_person: row.try_get("per_person")?,
        min_participants: row.try_get("min_participants")?,
        max_participants: row.try_get("max_participants")?,
        is_active: row.try_get("is_active")?,
        valid_from: row.try_get("valid_from")?,
        valid_to: row.try_get("valid_to")?,
    })
}

fn city_from_row(row: &PgRow) -> Result<City> {
    let region_id: Option<i64> = row.try_get("region_id")?;
    let region = match region_id {
        Some(id) => Some(Region {
            id,
            name: row.try_get("region_name")?,
            country_id: row.try_get("country_id")?,
        }),
        None => None,
    };
    Ok(City {
        id: row.try_get("city_id")?,
        name: row.try_get("city_name")?,
        region,
    })
}
