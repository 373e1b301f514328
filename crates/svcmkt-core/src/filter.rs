//! Declarative filtering and sorting of in-memory listings.
//!
//! A [`ListingQuery`] describes what the user asked for (search text,
//! category, status, price range, location radius, sort order).
//! [`apply_query`] ANDs every active predicate, then stable-sorts the
//! survivors so records that tie on the sort key keep their catalog order.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::{ProviderProfile, ServiceListing};
use crate::geo::{is_within_radius, Coordinates};

/// What the filter engine needs to know about a record.
pub trait Listing {
    /// Fields searched by free text, OR-ed together.
    fn search_fields(&self) -> Vec<&str>;
    fn category(&self) -> &str;
    fn status(&self) -> &str;
    fn price(&self) -> Option<Decimal>;
    fn rating(&self) -> f64;
    /// Review count; drives the "popular" ordering.
    fn popularity(&self) -> u32;
    fn listed_at(&self) -> DateTime<Utc>;
    fn coordinates(&self) -> Option<Coordinates>;
}

impl Listing for ServiceListing {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.title.as_str(),
            self.description.as_str(),
            self.provider_name.as_str(),
        ];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn price(&self) -> Option<Decimal> {
        Some(self.price)
    }

    fn rating(&self) -> f64 {
        self.rating
    }

    fn popularity(&self) -> u32 {
        self.review_count
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}

impl Listing for ProviderProfile {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.bio.as_str()];
        fields.extend(self.skills.iter().map(String::as_str));
        fields
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn status(&self) -> &str {
        &self.status
    }

    fn price(&self) -> Option<Decimal> {
        self.hourly_rate
    }

    fn rating(&self) -> f64 {
        self.rating
    }

    fn popularity(&self) -> u32 {
        self.review_count
    }

    fn listed_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    Rating,
    Popularity,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Newest => write!(f, "newest"),
            SortKey::Oldest => write!(f, "oldest"),
            SortKey::PriceAsc => write!(f, "price-asc"),
            SortKey::PriceDesc => write!(f, "price-desc"),
            SortKey::Rating => write!(f, "rating"),
            SortKey::Popularity => write!(f, "popular"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort key '{0}'; expected newest, oldest, price-asc, price-desc, rating or popular")]
pub struct ParseSortKeyError(String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "price-asc" | "price_low" => Ok(SortKey::PriceAsc),
            "price-desc" | "price_high" => Ok(SortKey::PriceDesc),
            "rating" => Ok(SortKey::Rating),
            "popular" | "popularity" => Ok(SortKey::Popularity),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

/// Inclusive price bounds; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl PriceRange {
    #[must_use]
    pub fn contains(&self, price: Decimal) -> bool {
        self.min.is_none_or(|min| price >= min) && self.max.is_none_or(|max| price <= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFilter {
    pub center: Coordinates,
    pub radius_km: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub price_range: Option<PriceRange>,
    pub sort: SortKey,
    pub location: Option<LocationFilter>,
}

impl ListingQuery {
    /// Returns `true` when `record` passes every active predicate.
    #[must_use]
    pub fn matches<T: Listing + ?Sized>(&self, record: &T) -> bool {
        let needle = normalized_needle(self.search.as_deref());
        self.matches_with(record, needle.as_deref())
    }

    fn matches_with<T: Listing + ?Sized>(&self, record: &T, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            let hit = record
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(needle));
            if !hit {
                return false;
            }
        }

        if !exact_or_all(self.category.as_deref(), record.category()) {
            return false;
        }
        if !exact_or_all(self.status.as_deref(), record.status()) {
            return false;
        }

        if let Some(range) = &self.price_range {
            if !record.price().is_some_and(|price| range.contains(price)) {
                return false;
            }
        }

        // Records without a position never pass an active location filter.
        match &self.location {
            Some(filter) => record.coordinates().is_some_and(|position| {
                is_within_radius(&filter.center, &position, filter.radius_km)
            }),
            None => true,
        }
    }
}

fn normalized_needle(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

/// `None`, blank, and `"all"` disable the predicate; otherwise the values
/// must match ignoring ASCII case.
fn exact_or_all(wanted: Option<&str>, actual: &str) -> bool {
    match wanted.map(str::trim) {
        None | Some("") => true,
        Some(w) if w.eq_ignore_ascii_case("all") => true,
        Some(w) => w.eq_ignore_ascii_case(actual.trim()),
    }
}

/// Filters `records` by every active predicate in `query`, then sorts the
/// survivors by `query.sort`.
///
/// The sort is stable: records that tie on the sort key keep their relative
/// order from `records`.
#[must_use]
pub fn apply_query<'a, T: Listing>(records: &'a [T], query: &ListingQuery) -> Vec<&'a T> {
    let needle = normalized_needle(query.search.as_deref());
    let mut matched: Vec<&T> = records
        .iter()
        .filter(|record| query.matches_with(*record, needle.as_deref()))
        .collect();
    sort_listings(&mut matched, query.sort);
    matched
}

/// Stable in-place sort by a single key.
pub fn sort_listings<T: Listing + ?Sized>(records: &mut [&T], key: SortKey) {
    records.sort_by(|a, b| compare(*a, *b, key));
}

fn compare<T: Listing + ?Sized>(a: &T, b: &T, key: SortKey) -> Ordering {
    match key {
        SortKey::Newest => b.listed_at().cmp(&a.listed_at()),
        SortKey::Oldest => a.listed_at().cmp(&b.listed_at()),
        // Unpriced records sort last in both directions.
        SortKey::PriceAsc => match (a.price(), b.price()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::PriceDesc => match (a.price(), b.price()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Rating => b.rating().total_cmp(&a.rating()),
        SortKey::Popularity => b.popularity().cmp(&a.popularity()),
    }
}

/// Distance from `center` to the record, if the record has a position.
#[must_use]
pub fn distance_from<T: Listing + ?Sized>(record: &T, center: &Coordinates) -> Option<f64> {
    record
        .coordinates()
        .map(|position| center.distance_km(&position))
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
