//! In-memory filter, sort and paginate engine.
//!
//! Operates on a snapshot of candidate records taken from a repository. Records opt in by
//! implementing [`Searchable`]; the engine never fails.

pub mod collation;

use crate::api::models::pagination::PaginationMeta;
use crate::api::models::search::{SearchParams, SortOrder};
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cmp::Ordering;

/// How a filter value is compared against a record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Exact,
    IgnoreCase,
}

impl MatchMode {
    fn matches(&self, record: &str, wanted: &str) -> bool {
        match self {
            MatchMode::Exact => record == wanted,
            MatchMode::IgnoreCase => record.to_lowercase() == wanted.to_lowercase(),
        }
    }
}

/// Value a record sorts by. Missing values sort before present ones.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Missing,
    Number(i64),
    Time(DateTime<Utc>),
    Text(&'a str),
}

impl SortValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Number(_) => 1,
            SortValue::Time(_) => 2,
            SortValue::Text(_) => 3,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.cmp(b),
            (SortValue::Time(a), SortValue::Time(b)) => a.cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => collation::locale_cmp(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

pub trait Searchable {
    /// Fields checked by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Values of `field` checked by equality filters. Unknown fields have no values.
    fn filter_values(&self, field: &str) -> Vec<Cow<'_, str>>;

    fn match_mode(_field: &str) -> MatchMode
    where
        Self: Sized,
    {
        MatchMode::Exact
    }

    fn sort_value(&self, field: &str) -> SortValue<'_>;
}

/// Case-insensitive substring match against any searchable field.
pub fn matches_query<T: Searchable>(record: &T, query: &str) -> bool {
    let needle = query.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Filters AND together; the values of one filter OR together.
pub fn matches_filters<T: Searchable>(record: &T, params: &SearchParams) -> bool {
    params.filters().iter().all(|(name, wanted)| {
        let mode = T::match_mode(name);
        let values = record.filter_values(name);
        wanted
            .iter()
            .any(|w| values.iter().any(|v| mode.matches(v, w)))
    })
}

pub fn filter<T: Searchable>(records: Vec<T>, params: &SearchParams) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| params.query().is_none_or(|q| matches_query(record, q)))
        .filter(|record| matches_filters(record, params))
        .collect()
}

/// Stable sort; descending reverses the comparator so ties keep their input order.
pub fn sort<T: Searchable>(records: &mut [T], field: &str, order: SortOrder) {
    records.sort_by(|a, b| {
        let ordering = a.sort_value(field).compare(&b.sort_value(field));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Slice `[offset, offset + per_page)`; pages past the end are empty.
pub fn paginate<T>(records: Vec<T>, page: u32, per_page: u32) -> Vec<T> {
    let per_page = per_page.max(1) as usize;
    let offset = (page.max(1) as usize - 1).saturating_mul(per_page);
    records.into_iter().skip(offset).take(per_page).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

/// Filter, sort and paginate a candidate set. `meta.total` counts matches before pagination.
pub fn run<T: Searchable>(records: Vec<T>, params: &SearchParams) -> SearchOutcome<T> {
    let mut matched = filter(records, params);
    sort(&mut matched, params.sort(), params.order());
    let meta = PaginationMeta::new(matched.len() as u64, params.page(), params.per_page());
    SearchOutcome {
        items: paginate(matched, params.page(), params.per_page()),
        meta,
    }
}
