//! Package catalog entities as returned by the store and serialized to clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    Group,
    Private,
    SelfGuided,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::Group => "group",
            PackageType::Private => "private",
            PackageType::SelfGuided => "self-guided",
        }
    }
}

impl FromStr for PackageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(PackageType::Group),
            "private" => Ok(PackageType::Private),
            "self-guided" | "self_guided" => Ok(PackageType::SelfGuided),
            other => Err(format!(
                "unknown package type '{other}' (expected group, private or self-guided)"
            )),
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Moderate => "moderate",
            Difficulty::Challenging => "challenging",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "moderate" => Ok(Difficulty::Moderate),
            "challenging" => Ok(Difficulty::Challenging),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "unknown difficulty '{other}' (expected easy, moderate, challenging or hard)"
            )),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub country_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub id: i64,
    pub name: String,
    pub logo_url: Option<String>,
}

/// One purchasable variant of a package.
///
/// A missing `valid_from` / `valid_to` leaves that side of the validity window open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOption {
    pub id: i64,
    pub package_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub currency_id: i64,
    pub currency_code: Option<String>,
    pub amount: Decimal,
    pub per_person: bool,
    pub min_participants: Option<i32>,
    pub max_participants: Option<i32>,
    pub is_active: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: i64,
    pub url: String,
    pub media_type: String,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// Itinerary stop, distinct from the representative city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLocation {
    pub city: City,
    pub order: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub package_type: PackageType,
    pub difficulty: Difficulty,
    pub is_active: bool,
    pub rating: f64,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_participants: Option<i32>,
    pub max_participants: Option<i32>,
    pub meeting_point_lat: Option<f64>,
    pub meeting_point_lng: Option<f64>,
    pub city_id: Option<i64>,
    pub duration: Option<String>,
    pub included_items: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Eager-loaded relations; absent unless requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanySummary>,
    #[serde(default)]
    pub pricing_options: Vec<PricingOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_media: Option<MediaItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<City>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<PackageLocation>,
}

impl Package {
    /// Meeting point as `(lat, lng)` when both coordinates are recorded.
    pub fn meeting_point(&self) -> Option<(f64, f64)> {
        match (self.meeting_point_lat, self.meeting_point_lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

}

/// A nearby-search hit with its great-circle distance from the requested center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPackage {
    #[serde(flatten)]
    pub package: Package,
    pub distance_km: f64,
}
