//! Search criteria parsing and validation
//!
//! Query strings arrive as ordered `(key, value)` items. Parsing turns them into typed
//! criteria; validation then rejects out-of-range values and inverted ranges before
//! any store query runs. Empty values count as absent and unknown keys are ignored.
//! When a key repeats, the last occurrence wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value as JsonValue};
use std::str::FromStr;
use validator::{Validate, ValidationError};

use super::sort::{SortKey, SortOrder, SortSpec};
use super::string_normalization::normalize_search_text;
use crate::config::SearchConfig;
use crate::models::{Difficulty, PackageType};
use crate::{Error, Result};

/// Criteria for the general and by-city search modes.
#[derive(Debug, Clone, PartialEq, Validate)]
#[validate(schema(function = "validate_search_ranges"))]
pub struct SearchCriteria {
    pub destination: Option<String>,
    pub city_id: Option<i64>,
    pub region_id: Option<i64>,
    /// Free text matched against name, description and included items.
    pub search: Option<String>,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub travelers: Option<i32>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub min_participants: Option<i32>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub max_participants: Option<i32>,

    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub currency_id: Option<i64>,

    #[validate(range(min = 0, max = 150, message = "must be between 0 and 150"))]
    pub min_age: Option<i32>,
    #[validate(range(min = 0, max = 150, message = "must be between 0 and 150"))]
    pub max_age: Option<i32>,
    #[validate(range(min = 0.0, max = 5.0, message = "must be between 0 and 5"))]
    pub min_rating: Option<f64>,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    pub package_type: Option<PackageType>,
    pub difficulty: Option<Difficulty>,
    pub company_id: Option<i64>,
    pub language_id: Option<i64>,
    pub duration: Option<String>,
    pub has_hotel_pickup: Option<bool>,
    pub is_active: bool,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: u32,
    pub limit: u32,
    pub sort: SortSpec,
}

/// Criteria for the nearby mode.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NearbyCriteria {
    #[validate(range(min = -90.0, max = 90.0, message = "must be between -90 and 90"))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "must be between -180 and 180"))]
    pub lng: f64,
    pub radius_km: f64,
    pub package_type: Option<PackageType>,
    pub difficulty: Option<Difficulty>,
    pub is_active: bool,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: u32,
    pub limit: u32,
}

fn validate_search_ranges(c: &SearchCriteria) -> std::result::Result<(), ValidationError> {
    fn range_error(code: &'static str, message: &'static str) -> ValidationError {
        let mut err = ValidationError::new(code);
        err.message = Some(message.into());
        err
    }

    for price in [c.min_price, c.max_price].into_iter().flatten() {
        if price.is_sign_negative() {
            return Err(range_error(
                "negative_price",
                "minPrice and maxPrice must not be negative",
            ));
        }
    }
    if let (Some(min), Some(max)) = (c.min_price, c.max_price) {
        if min > max {
            return Err(range_error(
                "price_range",
                "minPrice must not exceed maxPrice",
            ));
        }
    }
    if let (Some(start), Some(end)) = (c.start_date, c.end_date) {
        if start > end {
            return Err(range_error(
                "date_range",
                "startDate must not be after endDate",
            ));
        }
    }
    if let (Some(min), Some(max)) = (c.min_age, c.max_age) {
        if min > max {
            return Err(range_error("age_range", "minAge must not exceed maxAge"));
        }
    }
    if let (Some(min), Some(max)) = (c.min_participants, c.max_participants) {
        if min > max {
            return Err(range_error(
                "participant_range",
                "minParticipants must not exceed maxParticipants",
            ));
        }
    }
    Ok(())
}

impl SearchCriteria {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            destination: None,
            city_id: None,
            region_id: None,
            search: None,
            travelers: None,
            min_participants: None,
            max_participants: None,
            min_price: None,
            max_price: None,
            currency_id: None,
            min_age: None,
            max_age: None,
            min_rating: None,
            start_date: None,
            end_date: None,
            package_type: None,
            difficulty: None,
            company_id: None,
            language_id: None,
            duration: None,
            has_hotel_pickup: None,
            is_active: true,
            page: 1,
            limit: config.default_limit,
            sort: SortSpec::default(),
        }
    }

    /// Parse and validate query items.
    pub fn from_items(items: &[(String, String)], config: &SearchConfig) -> Result<Self> {
        let mut criteria = Self::new(config);
        let mut sort_key = None;
        let mut sort_order = None;

        for (key, value) in items {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "destination" => criteria.destination = text(value),
                "cityId" => criteria.city_id = Some(parse(key, value)?),
                "regionId" => criteria.region_id = Some(parse(key, value)?),
                "search" => criteria.search = text(value),
                "travelers" => criteria.travelers = Some(parse(key, value)?),
                "minParticipants" => criteria.min_participants = Some(parse(key, value)?),
                "maxParticipants" => criteria.max_participants = Some(parse(key, value)?),
                "minPrice" => criteria.min_price = Some(parse_decimal(key, value)?),
                "maxPrice" => criteria.max_price = Some(parse_decimal(key, value)?),
                "currencyId" => criteria.currency_id = Some(parse(key, value)?),
                "minAge" => criteria.min_age = Some(parse(key, value)?),
                "maxAge" => criteria.max_age = Some(parse(key, value)?),
                "minRating" => criteria.min_rating = Some(parse_finite(key, value)?),
                "startDate" => criteria.start_date = Some(parse_date(key, value, DayEdge::Start)?),
                "endDate" => criteria.end_date = Some(parse_date(key, value, DayEdge::End)?),
                "type" => criteria.package_type = Some(parse(key, value)?),
                "difficulty" => criteria.difficulty = Some(parse(key, value)?),
                "companyId" => criteria.company_id = Some(parse(key, value)?),
                "languageId" => criteria.language_id = Some(parse(key, value)?),
                "duration" => criteria.duration = text(value),
                "hasHotelPickup" => criteria.has_hotel_pickup = Some(parse_bool(key, value)?),
                "isActive" => criteria.is_active = parse_bool(key, value)?,
                "page" => criteria.page = parse(key, value)?,
                "limit" => criteria.limit = parse(key, value)?,
                "sortBy" => sort_key = Some(parse::<SortKey>(key, value)?),
                "order" => sort_order = Some(parse::<SortOrder>(key, value)?),
                _ => {}
            }
        }

        let default_sort = SortSpec::default();
        criteria.sort = SortSpec {
            key: sort_key.unwrap_or(default_sort.key),
            order: sort_order.unwrap_or(default_sort.order),
        };

        criteria.validate()?;
        check_limit(criteria.limit, config)?;
        Ok(criteria)
    }

    /// Whether the price/validity stage has work to do.
    pub fn needs_post_filter(&self) -> bool {
        self.min_price.is_some()
            || self.max_price.is_some()
            || self.currency_id.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }

    /// Normalized criteria actually applied, omitting absent ones.
    pub fn filters_echo(&self) -> JsonValue {
        let mut map = Map::new();
        let mut put = |key: &str, value: JsonValue| {
            map.insert(key.to_string(), value);
        };

        if self.city_id.is_some() || self.region_id.is_some() {
            if let Some(id) = self.city_id {
                put("cityId", id.into());
            }
            if let Some(id) = self.region_id {
                put("regionId", id.into());
            }
        } else if let Some(d) = &self.destination {
            put("destination", d.as_str().into());
        }
        if let Some(v) = &self.search {
            put("search", v.as_str().into());
        }
        if let Some(v) = self.travelers {
            put("travelers", v.into());
        }
        if let Some(v) = self.min_participants {
            put("minParticipants", v.into());
        }
        if let Some(v) = self.max_participants {
            put("maxParticipants", v.into());
        }
        if let Some(v) = self.min_price {
            put("minPrice", v.to_string().into());
        }
        if let Some(v) = self.max_price {
            put("maxPrice", v.to_string().into());
        }
        if let Some(v) = self.currency_id {
            put("currencyId", v.into());
        }
        if let Some(v) = self.min_age {
            put("minAge", v.into());
        }
        if let Some(v) = self.max_age {
            put("maxAge", v.into());
        }
        if let Some(v) = self.min_rating {
            put("minRating", v.into());
        }
        if let Some(v) = self.start_date {
            put("startDate", v.to_rfc3339().into());
        }
        if let Some(v) = self.end_date {
            put("endDate", v.to_rfc3339().into());
        }
        if let Some(v) = self.package_type {
            put("type", v.as_str().into());
        }
        if let Some(v) = self.difficulty {
            put("difficulty", v.as_str().into());
        }
        if let Some(v) = self.company_id {
            put("companyId", v.into());
        }
        if let Some(v) = self.language_id {
            put("languageId", v.into());
        }
        if let Some(v) = &self.duration {
            put("duration", v.as_str().into());
        }
        if let Some(v) = self.has_hotel_pickup {
            put("hasHotelPickup", v.into());
        }
        put("isActive", self.is_active.into());
        put("sortBy", self.sort.key.as_str().into());
        put("order", self.sort.order.as_str().into());

        JsonValue::Object(map)
    }
}

impl NearbyCriteria {
    /// Parse and validate query items; `lat` and `lng` are required.
    pub fn from_items(items: &[(String, String)], config: &SearchConfig) -> Result<Self> {
        let mut lat = None;
        let mut lng = None;
        let mut criteria = Self {
            lat: 0.0,
            lng: 0.0,
            radius_km: config.default_radius_km,
            package_type: None,
            difficulty: None,
            is_active: true,
            page: 1,
            limit: config.default_limit,
        };

        for (key, value) in items {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "lat" => lat = Some(parse_finite(key, value)?),
                "lng" => lng = Some(parse_finite(key, value)?),
                "radiusKm" => criteria.radius_km = parse_finite(key, value)?,
                "type" => criteria.package_type = Some(parse(key, value)?),
                "difficulty" => criteria.difficulty = Some(parse(key, value)?),
                "isActive" => criteria.is_active = parse_bool(key, value)?,
                "page" => criteria.page = parse(key, value)?,
                "limit" => criteria.limit = parse(key, value)?,
                _ => {}
            }
        }

        criteria.lat = lat.ok_or_else(|| Error::invalid_input("lat", "is required"))?;
        criteria.lng = lng.ok_or_else(|| Error::invalid_input("lng", "is required"))?;

        criteria.validate()?;
        if criteria.radius_km < config.min_radius_km || criteria.radius_km > config.max_radius_km
        {
            return Err(Error::invalid_input(
                "radiusKm",
                format!(
                    "must be between {} and {}",
                    config.min_radius_km, config.max_radius_km
                ),
            ));
        }
        check_limit(criteria.limit, config)?;
        Ok(criteria)
    }
}

fn check_limit(limit: u32, config: &SearchConfig) -> Result<()> {
    if limit == 0 || limit > config.max_limit {
        return Err(Error::invalid_input(
            "limit",
            format!("must be between 1 and {}", config.max_limit),
        ));
    }
    Ok(())
}

fn text(value: &str) -> Option<String> {
    let normalized = normalize_search_text(value);
    (!normalized.is_empty()).then_some(normalized)
}

fn parse<T>(field: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| Error::invalid_input(field, format!("'{value}' is not valid: {e}")))
}

fn parse_finite(field: &str, value: &str) -> Result<f64> {
    let parsed: f64 = parse(field, value)?;
    if !parsed.is_finite() {
        return Err(Error::invalid_input(field, "must be a finite number"));
    }
    Ok(parsed)
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value)
        .map_err(|_| Error::invalid_input(field, format!("'{value}' is not a decimal number")))
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::invalid_input(
            field,
            format!("'{value}' is not a boolean"),
        )),
    }
}

#[derive(Clone, Copy)]
enum DayEdge {
    Start,
    End,
}

/// RFC 3339 timestamps are taken as-is and local date-times without an offset are read
/// as UTC. A bare `YYYY-MM-DD` covers the whole day: midnight for a range start, the
/// last nanosecond of the day for a range end.
fn parse_date(field: &str, value: &str, edge: DayEdge) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(local) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(local.and_utc());
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        Error::invalid_input(
            field,
            format!("'{value}' is not an ISO-8601 date (YYYY-MM-DD) or date-time"),
        )
    })?;
    let time = match edge {
        DayEdge::Start => NaiveTime::MIN,
        DayEdge::End => {
            NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
        }
    };
    Ok(date.and_time(time).and_utc())
}
