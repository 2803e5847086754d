use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tour_search::db::PackageRecord;
use tour_search::models::{
    City, CompanySummary, Difficulty, MediaItem, Package, PackageLocation, PackageType,
    PricingOption,
};

use super::fixtures::constants::PEN_ID;

/// Creation times increase with the id, so the default `createdAt desc` order is
/// descending id.
fn created_at(id: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id)
}

/// `2026-06-01` or a full RFC 3339 timestamp.
pub fn at(value: &str) -> DateTime<Utc> {
    if value.len() == 10 {
        format!("{value}T00:00:00Z").parse().unwrap()
    } else {
        value.parse().unwrap()
    }
}

pub struct PackageBuilder {
    record: PackageRecord,
}

impl PackageBuilder {
    pub fn new(id: i64, name: &str) -> Self {
        let package = Package {
            id,
            company_id: 1,
            name: name.to_string(),
            description: None,
            package_type: PackageType::Group,
            difficulty: Difficulty::Easy,
            is_active: true,
            rating: 4.0,
            min_age: None,
            max_age: None,
            min_participants: None,
            max_participants: None,
            meeting_point_lat: None,
            meeting_point_lng: None,
            city_id: None,
            duration: None,
            included_items: Vec::new(),
            created_at: created_at(id),
            updated_at: created_at(id),
            company: None,
            pricing_options: Vec::new(),
            primary_media: None,
            city: None,
            locations: Vec::new(),
        };
        let mut record = PackageRecord::new(package);
        record.company = Some(CompanySummary {
            id: 1,
            name: "Andes Trails".to_string(),
            logo_url: None,
        });
        Self { record }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.record.package.description = Some(description.to_string());
        self
    }

    pub fn package_type(mut self, package_type: PackageType) -> Self {
        self.record.package.package_type = package_type;
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.record.package.difficulty = difficulty;
        self
    }

    pub fn rating(mut self, rating: f64) -> Self {
        self.record.package.rating = rating;
        self
    }

    pub fn ages(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.record.package.min_age = min;
        self.record.package.max_age = max;
        self
    }

    pub fn participants(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.record.package.min_participants = min;
        self.record.package.max_participants = max;
        self
    }

    pub fn meeting_point(mut self, lat: f64, lng: f64) -> Self {
        self.record.package.meeting_point_lat = Some(lat);
        self.record.package.meeting_point_lng = Some(lng);
        self
    }

    pub fn duration(mut self, duration: &str) -> Self {
        self.record.package.duration = Some(duration.to_string());
        self
    }

    pub fn city(mut self, city: City) -> Self {
        self.record.package.city_id = Some(city.id);
        self.record.city = Some(city);
        self
    }

    pub fn location(mut self, city: City, order: i32) -> Self {
        self.record.locations.push(PackageLocation {
            city,
            order,
            notes: None,
        });
        self
    }

    pub fn included(mut self, item: &str) -> Self {
        self.record.package.included_items.push(item.to_string());
        self
    }

    pub fn language(mut self, language_id: i64) -> Self {
        self.record.language_ids.push(language_id);
        self
    }

    pub fn hotel_pickup(mut self) -> Self {
        self.record.hotel_pickup = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.record.package.is_active = false;
        self
    }

    pub fn company(mut self, id: i64, name: &str) -> Self {
        self.record.package.company_id = id;
        self.record.company = Some(CompanySummary {
            id,
            name: name.to_string(),
            logo_url: None,
        });
        self
    }

    pub fn media(mut self, id: i64, url: &str, is_primary: bool) -> Self {
        self.record.media.push(MediaItem {
            id,
            url: url.to_string(),
            media_type: "image".to_string(),
            is_primary,
            sort_order: self.record.media.len() as i32,
        });
        self
    }

    pub fn pricing(mut self, pricing: PricingBuilder) -> Self {
        let option = pricing.build(self.record.package.id);
        self.record.pricing.push(option);
        self
    }

    pub fn build(self) -> PackageRecord {
        self.record
    }
}

pub struct PricingBuilder {
    option: PricingOption,
}

impl PricingBuilder {
    /// An active, per-person option in PEN with an open validity window.
    pub fn new(id: i64, name: &str, amount: &str) -> Self {
        Self {
            option: PricingOption {
                id,
                package_id: 0,
                name: name.to_string(),
                description: None,
                currency_id: PEN_ID,
                currency_code: Some("PEN".to_string()),
                amount: Decimal::from_str(amount).unwrap(),
                per_person: true,
                min_participants: None,
                max_participants: None,
                is_active: true,
                valid_from: None,
                valid_to: None,
            },
        }
    }

    pub fn currency(mut self, currency_id: i64, code: &str) -> Self {
        self.option.currency_id = currency_id;
        self.option.currency_code = Some(code.to_string());
        self
    }

    pub fn valid_from(mut self, value: &str) -> Self {
        self.option.valid_from = Some(at(value));
        self
    }

    pub fn valid_to(mut self, value: &str) -> Self {
        self.option.valid_to = Some(at(value));
        self
    }

    pub fn inactive(mut self) -> Self {
        self.option.is_active = false;
        self
    }

    pub fn build(mut self, package_id: i64) -> PricingOption {
        self.option.package_id = package_id;
        self.option
    }
}
