//! Typed filter tree shared by every package store.
//!
//! Stores receive a `Predicate` and decide how to evaluate it: the Postgres store
//! renders it into parameterized SQL, the in-memory store walks it directly.
//! Independent "any-of" groups stay separate `Or` nodes conjoined under an `And`,
//! so one group can never widen another.

use crate::models::{Difficulty, PackageType};
use crate::services::geo::BoundingBox;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Every child must hold. Empty means "always true".
    And(Vec<Predicate>),
    /// At least one child must hold. Empty means "never true".
    Or(Vec<Predicate>),
    Leaf(Condition),
}

/// A single store-level condition over a package and its relations.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    IsActive(bool),
    PackageType(PackageType),
    Difficulty(Difficulty),
    CompanyId(i64),
    /// Package is offered in the given language.
    LanguageId(i64),
    /// Exact match on the free-text duration label.
    Duration(String),
    MinRating(f64),

    /// Package minimum age absent or at most the value.
    MinAgeAllows(i32),
    /// Package maximum age absent or at least the value.
    MaxAgeAllows(i32),
    /// Absent participant bounds are unconstrained.
    CapacityIncludes(i32),
    MinParticipantsAtLeast(i32),
    MaxParticipantsAtMost(i32),
    HasHotelPickup(bool),

    // Case-insensitive substring matches.
    NameContains(String),
    DescriptionContains(String),
    /// Case-insensitive equality against one element of the included-items list.
    IncludesItem(String),
    CityNameContains(String),
    CityRegionNameContains(String),
    LocationCityNameContains(String),
    LocationRegionNameContains(String),

    CityIdEq(i64),
    LocationCityIdEq(i64),
    CityRegionIdEq(i64),
    LocationRegionIdEq(i64),

    MeetingPointWithin(BoundingBox),
}

impl Predicate {
    pub fn all(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub fn any(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    /// The predicate that matches everything.
    pub fn always() -> Self {
        Predicate::And(Vec::new())
    }

    /// Visit every leaf condition, depth first.
    pub fn for_each_condition<'a>(&'a self, f: &mut impl FnMut(&'a Condition)) {
        match self {
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.for_each_condition(f);
                }
            }
            Predicate::Leaf(condition) => f(condition),
        }
    }

    pub fn contains(&self, wanted: &Condition) -> bool {
        let mut found = false;
        self.for_each_condition(&mut |c| found |= c == wanted);
        found
    }
}

impl From<Condition> for Predicate {
    fn from(condition: Condition) -> Self {
        Predicate::Leaf(condition)
    }
}
