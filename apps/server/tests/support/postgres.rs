//! Postgres-backed test app.
//!
//! Each app gets its own schema on the server named by
//! `TOUR_SEARCH__DATABASE__TEST_DATABASE_URL`, runs the migrations into it and is
//! seeded from the same `PackageRecord`s the in-memory app uses. Without that
//! setting the Postgres tests are skipped.

use anyhow::Context as _;
use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode},
    Router,
};
use futures::FutureExt as _;
use serde_json::Value;
use sqlx::{Connection as _, PgPool};
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use tour_search::api::create_router;
use tour_search::db::PackageRecord;
use tour_search::models::{City, Region};
use tour_search::{AppState, Config};
use url::Url;
use uuid::Uuid;

use super::{get_json, init_tracing, send};

/// Router over a freshly migrated and seeded Postgres schema.
pub struct PgTestApp {
    pub router: Router,
    pub state: AppState,
    schema: String,
    admin_database_url: String,
}

impl PgTestApp {
    /// `None` when no test database is configured.
    pub async fn new(records: &[PackageRecord]) -> anyhow::Result<Option<Self>> {
        init_tracing();

        let mut config = Config::load().context("load Config for tests")?;
        let Some(admin_database_url) = config.database.test_database_url.clone() else {
            return Ok(None);
        };

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let mut admin_conn = sqlx::PgConnection::connect(&admin_database_url)
            .await
            .context("connect admin db for schema create")?;
        sqlx::query(&format!(r#"CREATE SCHEMA "{schema}""#))
            .execute(&mut admin_conn)
            .await
            .context("create test schema")?;

        config.database.url = with_search_path(&admin_database_url, &schema)?;
        config.database.run_migrations = true;
        config.database.pool_min_size = 0;
        config.database.pool_max_size = 2;
        config.database.pool_timeout_seconds = 30;

        let state = AppState::new(config)
            .await
            .context("initialize AppState")?;
        let pool = state
            .db_pool
            .clone()
            .context("Postgres state without a pool")?;
        seed_catalog(&pool, records).await.context("seed catalog")?;

        Ok(Some(Self {
            router: create_router(state.clone()),
            state,
            schema,
            admin_database_url,
        }))
    }

    pub async fn cleanup(self) -> anyhow::Result<()> {
        if let Some(pool) = &self.state.db_pool {
            pool.close().await;
        }

        let mut admin_conn = sqlx::PgConnection::connect(&self.admin_database_url)
            .await
            .context("connect admin db for schema drop")?;
        sqlx::query(&format!(r#"DROP SCHEMA "{}" CASCADE"#, self.schema))
            .execute(&mut admin_conn)
            .await
            .context("drop test schema")?;
        Ok(())
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        send(&self.router, method, path_and_query).await
    }

    pub async fn get_json(&self, path_and_query: &str) -> anyhow::Result<(StatusCode, Value)> {
        get_json(&self.router, path_and_query).await
    }
}

pub async fn with_pg_test_app<F>(records: Vec<PackageRecord>, f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a PgTestApp) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>,
{
    let Some(app) = PgTestApp::new(&records).await? else {
        eprintln!("TOUR_SEARCH__DATABASE__TEST_DATABASE_URL not set; skipping Postgres test");
        return Ok(());
    };

    let result = AssertUnwindSafe(f(&app)).catch_unwind().await;
    let cleanup_result = app.cleanup().await;

    if let Err(e) = cleanup_result {
        eprintln!("test schema cleanup failed: {e:?}");
    }

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

fn with_search_path(database_url: &str, schema: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(database_url).context("parse database URL")?;
    url.query_pairs_mut()
        .append_pair("options", &format!("-c search_path={schema}"));
    Ok(url.to_string())
}

/// Insert the records and every row they reference.
pub async fn seed_catalog(pool: &PgPool, records: &[PackageRecord]) -> anyhow::Result<()> {
    let mut regions: BTreeMap<i64, Region> = BTreeMap::new();
    let mut cities: BTreeMap<i64, City> = BTreeMap::new();
    let mut companies: BTreeMap<i64, String> = BTreeMap::new();
    let mut currencies: BTreeMap<i64, String> = BTreeMap::new();

    for record in records {
        let stops = record.locations.iter().map(|l| &l.city);
        for city in record.city.iter().chain(stops) {
            if let Some(region) = &city.region {
                regions.insert(region.id, region.clone());
            }
            cities.insert(city.id, city.clone());
        }

        let company_id = record.package.company_id;
        let company_name = record
            .company
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Company {company_id}"));
        companies.insert(company_id, company_name);

        for option in &record.pricing {
            let code = option
                .currency_code
                .clone()
                .unwrap_or_else(|| format!("C{}", option.currency_id));
            currencies.insert(option.currency_id, code);
        }
    }

    let mut tx = pool.begin().await?;

    for region in regions.values() {
        sqlx::query("INSERT INTO regions (id, name, country_id) VALUES ($1, $2, $3)")
            .bind(region.id)
            .bind(&region.name)
            .bind(region.country_id)
            .execute(&mut *tx)
            .await?;
    }
    for city in cities.values() {
        sqlx::query("INSERT INTO cities (id, name, region_id) VALUES ($1, $2, $3)")
            .bind(city.id)
            .bind(&city.name)
            .bind(city.region.as_ref().map(|r| r.id))
            .execute(&mut *tx)
            .await?;
    }
    for (id, name) in &companies {
        let logo_url = records
            .iter()
            .filter_map(|r| r.company.as_ref())
            .find(|c| c.id == *id)
            .and_then(|c| c.logo_url.clone());
        sqlx::query("INSERT INTO companies (id, name, logo_url) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(logo_url)
            .execute(&mut *tx)
            .await?;
    }
    for (id, code) in &currencies {
        sqlx::query("INSERT INTO currencies (id, code) VALUES ($1, $2)")
            .bind(id)
            .bind(code)
            .execute(&mut *tx)
            .await?;
    }

    for record in records {
        let p = &record.package;
        sqlx::query(
            "INSERT INTO packages (id, company_id, name, description, package_type, difficulty, \
             is_active, rating, min_age, max_age, min_participants, max_participants, \
             meeting_point_lat, meeting_point_lng, city_id, duration, included_items, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19)",
        )
        .bind(p.id)
        .bind(p.company_id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(p.package_type.as_str())
        .bind(p.difficulty.as_str())
        .bind(p.is_active)
        .bind(p.rating)
        .bind(p.min_age)
        .bind(p.max_age)
        .bind(p.min_participants)
        .bind(p.max_participants)
        .bind(p.meeting_point_lat)
        .bind(p.meeting_point_lng)
        .bind(p.city_id)
        .bind(&p.duration)
        .bind(&p.included_items)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&mut *tx)
        .await?;

        for o in &record.pricing {
            sqlx::query(
                "INSERT INTO pricing_options (id, package_id, name, description, currency_id, \
                 amount, per_person, min_participants, max_participants, is_active, \
                 valid_from, valid_to) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(o.id)
            .bind(p.id)
            .bind(&o.name)
            .bind(&o.description)
            .bind(o.currency_id)
            .bind(o.amount)
            .bind(o.per_person)
            .bind(o.min_participants)
            .bind(o.max_participants)
            .bind(o.is_active)
            .bind(o.valid_from)
            .bind(o.valid_to)
            .execute(&mut *tx)
            .await?;
        }

        for stop in &record.locations {
            sqlx::query(
                "INSERT INTO package_locations (package_id, city_id, sort_order, notes) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(p.id)
            .bind(stop.city.id)
            .bind(stop.order)
            .bind(&stop.notes)
            .execute(&mut *tx)
            .await?;
        }

        for m in &record.media {
            sqlx::query(
                "INSERT INTO package_media (id, package_id, url, media_type, is_primary, sort_order) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(m.id)
            .bind(p.id)
            .bind(&m.url)
            .bind(&m.media_type)
            .bind(m.is_primary)
            .bind(m.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        for language_id in &record.language_ids {
            sqlx::query("INSERT INTO package_languages (package_id, language_id) VALUES ($1, $2)")
                .bind(p.id)
                .bind(language_id)
                .execute(&mut *tx)
                .await?;
        }

        if record.hotel_pickup {
            sqlx::query(
                "INSERT INTO package_pickup_details (package_id, hotel_pickup) VALUES ($1, TRUE)",
            )
            .bind(p.id)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}
