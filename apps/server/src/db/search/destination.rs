//! Destination resolution.
//!
//! A package's destination-matchable set is its representative city plus every
//! itinerary location. Each criterion becomes its own `Or` group over that set.

use super::predicate::{Condition, Predicate};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestinationCriteria<'a> {
    pub destination: Option<&'a str>,
    pub city_id: Option<i64>,
    pub region_id: Option<i64>,
}

/// Independent groups, one per supplied criterion, to be conjoined by the caller.
///
/// An exact `city_id` or `region_id` takes precedence over free text, which is then
/// ignored.
pub fn resolve_destination(criteria: DestinationCriteria<'_>) -> Vec<Predicate> {
    let mut groups = Vec::new();

    if let Some(id) = criteria.city_id {
        groups.push(Predicate::any(vec![
            Condition::CityIdEq(id).into(),
            Condition::LocationCityIdEq(id).into(),
        ]));
    }
    if let Some(id) = criteria.region_id {
        groups.push(Predicate::any(vec![
            Condition::CityRegionIdEq(id).into(),
            Condition::LocationRegionIdEq(id).into(),
        ]));
    }

    if groups.is_empty() {
        if let Some(text) = criteria.destination.filter(|t| !t.trim().is_empty()) {
            let text = text.trim().to_string();
            groups.push(Predicate::any(vec![
                Condition::CityNameContains(text.clone()).into(),
                Condition::CityRegionNameContains(text.clone()).into(),
                Condition::LocationCityNameContains(text.clone()).into(),
                Condition::LocationRegionNameContains(text).into(),
            ]));
        }
    }

    groups
}
