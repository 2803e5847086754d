//! Result ordering.
//!
//! `price` orders by each package's lowest active pricing amount; packages without an
//! active option sort last in either direction. Every ordering ends with `id ASC` so
//! pages are stable.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Name,
    Rating,
    Id,
    /// Lowest active pricing amount.
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::UpdatedAt => "updatedAt",
            SortKey::Name => "name",
            SortKey::Rating => "rating",
            SortKey::Id => "id",
            SortKey::Price => "price",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "createdAt" | "created_at" => Ok(SortKey::CreatedAt),
            "updatedAt" | "updated_at" => Ok(SortKey::UpdatedAt),
            "name" => Ok(SortKey::Name),
            "rating" => Ok(SortKey::Rating),
            "id" => Ok(SortKey::Id),
            "price" | "priceAsc" | "lowestPrice" => Ok(SortKey::Price),
            other => Err(format!(
                "unsupported sort key '{other}' (expected createdAt, updatedAt, name, rating, id or price)"
            )),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unsupported sort order '{other}' (expected asc or desc)")),
        }
    }
}

impl SortSpec {
    /// `ORDER BY` body for a query over `packages p`.
    pub fn order_by_sql(&self) -> String {
        let dir = self.order.sql();
        match self.key {
            SortKey::CreatedAt => format!("p.created_at {dir}, p.id ASC"),
            SortKey::UpdatedAt => format!("p.updated_at {dir}, p.id ASC"),
            SortKey::Name => format!("lower(p.name) {dir}, p.id ASC"),
            SortKey::Rating => format!("p.rating {dir}, p.id ASC"),
            SortKey::Id => format!("p.id {dir}"),
            SortKey::Price => format!(
                "(SELECT MIN(po.amount) FROM pricing_options po \
                 WHERE po.package_id = p.id AND po.is_active) {dir} NULLS LAST, p.id ASC"
            ),
        }
    }
}
