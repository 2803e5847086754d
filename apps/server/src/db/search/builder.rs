//! Predicate builder: criteria to a single conjunctive filter tree.

use super::destination::{resolve_destination, DestinationCriteria};
use super::params::{NearbyCriteria, SearchCriteria};
use super::predicate::{Condition, Predicate};
use crate::services::geo::BoundingBox;

/// Store-level filter for the general and by-city modes.
///
/// Price and validity bounds are not part of it; they belong to the post-filter.
pub fn build_search_predicate(c: &SearchCriteria) -> Predicate {
    let mut all: Vec<Predicate> = vec![Condition::IsActive(c.is_active).into()];

    if let Some(t) = c.package_type {
        all.push(Condition::PackageType(t).into());
    }
    if let Some(d) = c.difficulty {
        all.push(Condition::Difficulty(d).into());
    }
    if let Some(id) = c.company_id {
        all.push(Condition::CompanyId(id).into());
    }
    if let Some(id) = c.language_id {
        all.push(Condition::LanguageId(id).into());
    }
    if let Some(duration) = &c.duration {
        all.push(Condition::Duration(duration.clone()).into());
    }
    if let Some(rating) = c.min_rating {
        all.push(Condition::MinRating(rating).into());
    }
    if let Some(age) = c.min_age {
        all.push(Condition::MinAgeAllows(age).into());
    }
    if let Some(age) = c.max_age {
        all.push(Condition::MaxAgeAllows(age).into());
    }
    if let Some(travelers) = c.travelers {
        all.push(Condition::CapacityIncludes(travelers).into());
    }
    if let Some(v) = c.min_participants {
        all.push(Condition::MinParticipantsAtLeast(v).into());
    }
    if let Some(v) = c.max_participants {
        all.push(Condition::MaxParticipantsAtMost(v).into());
    }
    if let Some(wanted) = c.has_hotel_pickup {
        all.push(Condition::HasHotelPickup(wanted).into());
    }

    if let Some(text) = &c.search {
        all.push(Predicate::any(vec![
            Condition::NameContains(text.clone()).into(),
            Condition::DescriptionContains(text.clone()).into(),
            Condition::IncludesItem(text.clone()).into(),
        ]));
    }

    all.extend(resolve_destination(DestinationCriteria {
        destination: c.destination.as_deref(),
        city_id: c.city_id,
        region_id: c.region_id,
    }));

    Predicate::all(all)
}

/// Store-level filter for the nearby mode: equality filters plus the bounding box.
pub fn build_nearby_predicate(c: &NearbyCriteria, bbox: BoundingBox) -> Predicate {
    let mut all: Vec<Predicate> = vec![
        Condition::IsActive(c.is_active).into(),
        Condition::MeetingPointWithin(bbox).into(),
    ];
    if let Some(t) = c.package_type {
        all.push(Condition::PackageType(t).into());
    }
    if let Some(d) = c.difficulty {
        all.push(Condition::Difficulty(d).into());
    }
    Predicate::all(all)
}
