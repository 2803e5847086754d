//! In-process package store.
//!
//! Evaluates the same filter tree as the Postgres store over records held in memory.
//! Used by tests and local demos where no database is available.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::db::search::string_normalization::casefold;
use crate::db::search::{
    Condition, PackageQuery, Predicate, PricingLoad, Relations, SortKey, SortOrder, SortSpec,
};
use crate::db::traits::PackageStore;
use crate::models::{City, CompanySummary, MediaItem, Package, PackageLocation, PricingOption};
use crate::{Error, Result};

/// A package together with every relation the filters can reach.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    /// Base columns; relation fields on it are ignored and rebuilt per query.
    pub package: Package,
    pub company: Option<CompanySummary>,
    /// Every option, active or not.
    pub pricing: Vec<PricingOption>,
    pub media: Vec<MediaItem>,
    pub city: Option<City>,
    pub locations: Vec<PackageLocation>,
    pub language_ids: Vec<i64>,
    pub hotel_pickup: bool,
}

#[derive(Clone, Default)]
pub struct InMemoryPackageStore {
    records: Arc<Vec<PackageRecord>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryPackageStore {
    pub fn new(records: Vec<PackageRecord>) -> Self {
        Self {
            records: Arc::new(records),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent call fail as an unreachable store would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl PackageStore for InMemoryPackageStore {
    async fn find_packages(&self, query: &PackageQuery) -> Result<Vec<Package>> {
        self.ensure_available()?;

        let mut matches: Vec<&PackageRecord> = self
            .records
            .iter()
            .filter(|r| r.matches(&query.filter))
            .collect();
        matches.sort_by(|a, b| compare(a, b, query.sort));

        let window = query.window;
        let skip = window
            .map(|w| usize::try_from(w.skip).unwrap_or(usize::MAX))
            .unwrap_or(0);
        let take = window
            .map(|w| usize::try_from(w.take).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matches
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|r| r.hydrate(query.include))
            .collect())
    }

    async fn count_packages(&self, filter: &Predicate) -> Result<i64> {
        self.ensure_available()?;
        let count = self.records.iter().filter(|r| r.matches(filter)).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_available()
    }
}

impl PackageRecord {
    pub fn new(package: Package) -> Self {
        Self {
            package,
            company: None,
            pricing: Vec::new(),
            media: Vec::new(),
            city: None,
            locations: Vec::new(),
            language_ids: Vec::new(),
            hotel_pickup: false,
        }
    }

    fn matches(&self, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::And(children) => children.iter().all(|c| self.matches(c)),
            Predicate::Or(children) => children.iter().any(|c| self.matches(c)),
            Predicate::Leaf(condition) => self.satisfies(condition),
        }
    }

    fn satisfies(&self, condition: &Condition) -> bool {
        let p = &self.package;
        match condition {
            Condition::IsActive(v) => p.is_active == *v,
            Condition::PackageType(t) => p.package_type == *t,
            Condition::Difficulty(d) => p.difficulty == *d,
            Condition::CompanyId(id) => p.company_id == *id,
            Condition::LanguageId(id) => self.language_ids.contains(id),
            Condition::Duration(v) => p.duration.as_deref() == Some(v.as_str()),
            Condition::MinRating(v) => p.rating >= *v,

            Condition::MinAgeAllows(age) => p.min_age.map_or(true, |min| min <= *age),
            Condition::MaxAgeAllows(age) => p.max_age.map_or(true, |max| max >= *age),
            Condition::CapacityIncludes(n) => {
                p.min_participants.map_or(true, |min| min <= *n)
                    && p.max_participants.map_or(true, |max| max >= *n)
            }
            Condition::MinParticipantsAtLeast(v) => p.min_participants.is_some_and(|m| m >= *v),
            Condition::MaxParticipantsAtMost(v) => p.max_participants.is_some_and(|m| m <= *v),
            Condition::HasHotelPickup(wanted) => self.hotel_pickup == *wanted,

            Condition::NameContains(t) => contains(&p.name, t),
            Condition::DescriptionContains(t) => {
                p.description.as_deref().is_some_and(|d| contains(d, t))
            }
            Condition::IncludesItem(t) => {
                let wanted = casefold(t);
                p.included_items.iter().any(|item| casefold(item) == wanted)
            }
            Condition::CityNameContains(t) => self.city.as_ref().is_some_and(|c| contains(&c.name, t)),
            Condition::CityRegionNameContains(t) => self
                .city
                .as_ref()
                .and_then(|c| c.region.as_ref())
                .is_some_and(|r| contains(&r.name, t)),
            Condition::LocationCityNameContains(t) => {
                self.locations.iter().any(|l| contains(&l.city.name, t))
            }
            Condition::LocationRegionNameContains(t) => self
                .locations
                .iter()
                .filter_map(|l| l.city.region.as_ref())
                .any(|r| contains(&r.name, t)),

            Condition::CityIdEq(id) => p.city_id == Some(*id),
            Condition::LocationCityIdEq(id) => self.locations.iter().any(|l| l.city.id == *id),
            Condition::CityRegionIdEq(id) => self
                .city
                .as_ref()
                .and_then(|c| c.region.as_ref())
                .is_some_and(|r| r.id == *id),
            Condition::LocationRegionIdEq(id) => self
                .locations
                .iter()
                .filter_map(|l| l.city.region.as_ref())
                .any(|r| r.id == *id),

            Condition::MeetingPointWithin(bbox) => p
                .meeting_point()
                .is_some_and(|(lat, lng)| bbox.contains(lat, lng)),
        }
    }

    fn active_pricing(&self) -> Vec<PricingOption> {
        let mut options: Vec<PricingOption> =
            self.pricing.iter().filter(|o| o.is_active).cloned().collect();
        options.sort_by(|a, b| a.amount.cmp(&b.amount).then(a.id.cmp(&b.id)));
        options
    }

    fn primary_media(&self) -> Option<MediaItem> {
        self.media
            .iter()
            .min_by(|a, b| {
                b.is_primary
                    .cmp(&a.is_primary)
                    .then(a.sort_order.cmp(&b.sort_order))
                    .then(a.id.cmp(&b.id))
            })
            .cloned()
    }

    fn hydrate(&self, include: Relations) -> Package {
        let mut package = self.package.clone();
        package.company = if include.company {
            self.company.clone()
        } else {
            None
        };
        package.pricing_options = match include.pricing {
            PricingLoad::None => Vec::new(),
            PricingLoad::Cheapest => self.active_pricing().into_iter().take(1).collect(),
            PricingLoad::AllActive => self.active_pricing(),
        };
        package.primary_media = if include.primary_media {
            self.primary_media()
        } else {
            None
        };
        package.city = if include.city { self.city.clone() } else { None };
        package.locations = if include.locations {
            let mut locations = self.locations.clone();
            locations.sort_by(|a, b| a.order.cmp(&b.order).then(a.city.id.cmp(&b.city.id)));
            locations
        } else {
            Vec::new()
        };
        package
    }

    fn lowest_active_amount(&self) -> Option<rust_decimal::Decimal> {
        self.pricing
            .iter()
            .filter(|o| o.is_active)
            .map(|o| o.amount)
            .min()
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    casefold(haystack).contains(&casefold(needle))
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Mirrors `SortSpec::order_by_sql`.
fn compare(a: &PackageRecord, b: &PackageRecord, sort: SortSpec) -> Ordering {
    let (pa, pb) = (&a.package, &b.package);
    let id_asc = pa.id.cmp(&pb.id);
    match sort.key {
        SortKey::CreatedAt => directed(pa.created_at.cmp(&pb.created_at), sort.order).then(id_asc),
        SortKey::UpdatedAt => directed(pa.updated_at.cmp(&pb.updated_at), sort.order).then(id_asc),
        SortKey::Name => {
            directed(casefold(&pa.name).cmp(&casefold(&pb.name)), sort.order).then(id_asc)
        }
        SortKey::Rating => directed(pa.rating.total_cmp(&pb.rating), sort.order).then(id_asc),
        SortKey::Id => directed(id_asc, sort.order),
        SortKey::Price => {
            let by_price = match (a.lowest_active_amount(), b.lowest_active_amount()) {
                (Some(x), Some(y)) => directed(x.cmp(&y), sort.order),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_price.then(id_asc)
        }
    }
}
