//! Price and validity post-filter over fetched candidates.
//!
//! A package passes the price check when any pricing option (in the requested
//! currency, if one was given) falls within the amount bounds, and the validity check
//! when any option's window overlaps the requested dates. The two checks may be
//! satisfied by different options.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::{Package, PricingOption};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceFilter {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub currency_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidityFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// The in-memory stage applied after the store query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    pub price: PriceFilter,
    pub validity: ValidityFilter,
}

impl PriceFilter {
    /// A currency alone is a request too: some option must be priced in it.
    pub fn is_requested(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some() || self.currency_id.is_some()
    }

    pub fn accepts(&self, option: &PricingOption) -> bool {
        if let Some(currency_id) = self.currency_id {
            if option.currency_id != currency_id {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if option.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if option.amount > max {
                return false;
            }
        }
        true
    }
}

impl ValidityFilter {
    pub fn is_requested(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// An option is excluded only when its window ends before the requested start
    /// or begins after the requested end.
    pub fn accepts(&self, option: &PricingOption) -> bool {
        if let (Some(start), Some(valid_to)) = (self.start, option.valid_to) {
            if valid_to < start {
                return false;
            }
        }
        if let (Some(end), Some(valid_from)) = (self.end, option.valid_from) {
            if valid_from > end {
                return false;
            }
        }
        true
    }
}

/// Which check removed a package, for metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Price,
    Validity,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::Price => "price",
            Rejection::Validity => "validity",
        }
    }
}

impl PostFilter {
    pub fn is_active(&self) -> bool {
        self.price.is_requested() || self.validity.is_requested()
    }

    /// Evaluate one package against the active pricing options it carries.
    pub fn check(&self, package: &Package) -> Result<(), Rejection> {
        let mut options = package.pricing_options.iter().filter(|o| o.is_active);

        if self.price.is_requested() && !options.clone().any(|o| self.price.accepts(o)) {
            return Err(Rejection::Price);
        }
        if self.validity.is_requested() && !options.any(|o| self.validity.accepts(o)) {
            return Err(Rejection::Validity);
        }
        Ok(())
    }

    /// Keep passing packages in their incoming order; returns the kept packages and
    /// the number dropped per check.
    pub fn apply(&self, candidates: Vec<Package>) -> (Vec<Package>, DropCounts) {
        let mut dropped = DropCounts::default();
        if !self.is_active() {
            return (candidates, dropped);
        }

        let kept = candidates
            .into_iter()
            .filter(|package| match self.check(package) {
                Ok(()) => true,
                Err(Rejection::Price) => {
                    dropped.price += 1;
                    false
                }
                Err(Rejection::Validity) => {
                    dropped.validity += 1;
                    false
                }
            })
            .collect();

        (kept, dropped)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropCounts {
    pub price: u64,
    pub validity: u64,
}

impl DropCounts {
    pub fn by_check(&self) -> [(Rejection, u64); 2] {
        [
            (Rejection::Price, self.price),
            (Rejection::Validity, self.validity),
        ]
    }
}
