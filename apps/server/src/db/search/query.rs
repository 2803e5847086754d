//! Store-facing query description.

use super::predicate::Predicate;
use super::sort::SortSpec;

/// Which pricing options to attach to each package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingLoad {
    #[default]
    None,
    /// The single active option with the lowest amount.
    Cheapest,
    /// Every active option; required by the price/validity post-filter.
    AllActive,
}

/// Eager-load instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relations {
    pub company: bool,
    pub pricing: PricingLoad,
    pub primary_media: bool,
    /// Representative city with its region.
    pub city: bool,
    /// Itinerary locations with their cities and regions.
    pub locations: bool,
}

impl Relations {
    /// What list views show for each package, itinerary stops included.
    pub fn listing(pricing: PricingLoad) -> Self {
        Self {
            company: true,
            pricing,
            primary_media: true,
            city: true,
            locations: true,
        }
    }
}

/// Store-level offset/limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub take: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageQuery {
    pub filter: Predicate,
    pub include: Relations,
    pub sort: SortSpec,
    /// `None` fetches every match; used whenever an in-memory stage runs afterwards.
    pub window: Option<Window>,
}

impl PackageQuery {
    pub fn new(filter: Predicate) -> Self {
        Self {
            filter,
            include: Relations::default(),
            sort: SortSpec::default(),
            window: None,
        }
    }

    pub fn include(mut self, include: Relations) -> Self {
        self.include = include;
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn window(mut self, window: Option<Window>) -> Self {
        self.window = window;
        self
    }
}
