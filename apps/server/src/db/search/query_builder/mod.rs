//! SQL rendering for package queries.
//!
//! The typed filter tree becomes a `WHERE` expression over `packages p`; relation
//! loading is done by separate batched queries keyed on the returned package ids.

mod bind;
mod filter;

use super::predicate::Predicate;
use super::query::PackageQuery;
use bind::push_int;

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

const PACKAGE_COLUMNS: &str = "p.id, p.company_id, p.name, p.description, p.package_type, \
     p.difficulty, p.is_active, p.rating, p.min_age, p.max_age, p.min_participants, \
     p.max_participants, p.meeting_point_lat, p.meeting_point_lng, p.city_id, p.duration, \
     p.included_items, p.created_at, p.updated_at";

/// `SELECT` for the packages themselves, ordered and optionally windowed.
pub fn build_select_sql(query: &PackageQuery) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let where_clause = query.filter.build_sql(&mut bind_params);

    let mut sql = format!(
        "SELECT {PACKAGE_COLUMNS} FROM packages p WHERE {where_clause} ORDER BY {}",
        query.sort.order_by_sql()
    );

    if let Some(window) = query.window {
        let take = push_int(&mut bind_params, clamp_i64(window.take));
        let skip = push_int(&mut bind_params, clamp_i64(window.skip));
        sql.push_str(&format!(" LIMIT ${take} OFFSET ${skip}"));
    }

    (sql, bind_params)
}

pub fn build_count_sql(filter: &Predicate) -> (String, Vec<BindValue>) {
    let mut bind_params = Vec::new();
    let where_clause = filter.build_sql(&mut bind_params);
    (
        format!("SELECT COUNT(*) FROM packages p WHERE {where_clause}"),
        bind_params,
    )
}

fn clamp_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

// Relation loaders; `$1` is always the `BIGINT[]` of package ids.

pub const COMPANIES_SQL: &str = "SELECT p.id AS package_id, co.id, co.name, co.logo_url \
     FROM packages p JOIN companies co ON co.id = p.company_id \
     WHERE p.id = ANY($1)";

pub const CHEAPEST_PRICING_SQL: &str = "SELECT DISTINCT ON (po.package_id) \
     po.id, po.package_id, po.name, po.description, po.currency_id, cu.code AS currency_code, \
     po.amount, po.per_person, po.min_participants, po.max_participants, po.is_active, \
     po.valid_from, po.valid_to \
     FROM pricing_options po LEFT JOIN currencies cu ON cu.id = po.currency_id \
     WHERE po.package_id = ANY($1) AND po.is_active \
     ORDER BY po.package_id, po.amount ASC, po.id ASC";

pub const ACTIVE_PRICING_SQL: &str = "SELECT \
     po.id, po.package_id, po.name, po.description, po.currency_id, cu.code AS currency_code, \
     po.amount, po.per_person, po.min_participants, po.max_participants, po.is_active, \
     po.valid_from, po.valid_to \
     FROM pricing_options po LEFT JOIN currencies cu ON cu.id = po.currency_id \
     WHERE po.package_id = ANY($1) AND po.is_active \
     ORDER BY po.package_id, po.amount ASC, po.id ASC";

pub const PRIMARY_MEDIA_SQL: &str = "SELECT DISTINCT ON (m.package_id) \
     m.package_id, m.id, m.url, m.media_type, m.is_primary, m.sort_order \
     FROM package_media m \
     WHERE m.package_id = ANY($1) \
     ORDER BY m.package_id, m.is_primary DESC, m.sort_order ASC, m.id ASC";

pub const CITIES_SQL: &str = "SELECT p.id AS package_id, c.id AS city_id, c.name AS city_name, \
     r.id AS region_id, r.name AS region_name, r.country_id \
     FROM packages p JOIN cities c ON c.id = p.city_id \
     LEFT JOIN regions r ON r.id = c.region_id \
     WHERE p.id = ANY($1)";

pub const LOCATIONS_SQL: &str = "SELECT pl.package_id, pl.sort_order, pl.notes, \
     c.id AS city_id, c.name AS city_name, \
     r.id AS region_id, r.name AS region_name, r.country_id \
     FROM package_locations pl JOIN cities c ON c.id = pl.city_id \
     LEFT JOIN regions r ON r.id = c.region_id \
     WHERE pl.package_id = ANY($1) \
     ORDER BY pl.package_id, pl.sort_order ASC, c.id ASC";
