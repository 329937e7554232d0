//! Query parameter validation for list endpoints.
//!
//! Raw query strings are parsed into a [`QueryParams`] multimap (repeated keys are kept in order),
//! then checked against a per-resource [`SearchSchema`] to produce immutable [`SearchParams`].

use super::validation::FieldErrors;
use crate::errors::FieldError;
use crate::jsonapi::LinkTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Ordered multimap of raw query values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|raw| {
                url::form_urlencoded::parse(raw.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self(pairs)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// First non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    /// Every non-empty value for `key`, accepting both `key=a&key=b` and `key[]=a&key[]=b`.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        let bracketed = format!("{key}[]");
        self.0
            .iter()
            .filter(|(k, _)| k == key || *k == bracketed)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("order must be 'asc' or 'desc', got '{other}'")),
        }
    }
}

/// A recognised equality filter.
#[derive(Debug, Clone, Copy)]
pub struct FilterSpec {
    pub name: &'static str,
    /// Accepts repeated keys; any of the values may match
    pub multi: bool,
    /// Value meaning "no filter", e.g. `role=all`
    pub wildcard: Option<&'static str>,
}

impl FilterSpec {
    pub const fn single(name: &'static str) -> Self {
        Self {
            name,
            multi: false,
            wildcard: None,
        }
    }

    pub const fn multi(name: &'static str) -> Self {
        Self {
            name,
            multi: true,
            wildcard: None,
        }
    }

    pub const fn with_wildcard(mut self, wildcard: &'static str) -> Self {
        self.wildcard = Some(wildcard);
        self
    }
}

/// Which query keys a list endpoint understands and how strictly it checks them.
#[derive(Debug, Clone, Copy)]
pub struct SearchSchema {
    pub query_key: &'static str,
    pub per_page_key: &'static str,
    pub filters: &'static [FilterSpec],
    pub sortable: &'static [&'static str],
    pub default_sort: &'static str,
    pub default_order: SortOrder,
    pub default_per_page: u32,
    /// Reject present-but-invalid values instead of falling back to defaults
    pub strict: bool,
}

pub const LAW_FIRM_SEARCH: SearchSchema = SearchSchema {
    query_key: "q",
    per_page_key: "per_page",
    filters: &[FilterSpec::single("city"), FilterSpec::multi("specializations")],
    sortable: &["name", "city", "founded_date", "created_at", "updated_at"],
    default_sort: "name",
    default_order: SortOrder::Asc,
    default_per_page: SearchParams::DEFAULT_PER_PAGE,
    strict: true,
};

pub const USER_SEARCH: SearchSchema = SearchSchema {
    query_key: "search",
    per_page_key: "limit",
    filters: &[
        FilterSpec::single("role").with_wildcard("all"),
        FilterSpec::single("status").with_wildcard("all"),
    ],
    sortable: &["created_at", "email"],
    default_sort: "created_at",
    default_order: SortOrder::Desc,
    default_per_page: 50,
    strict: false,
};

/// Validated search parameters. Page is always ≥ 1 and page size always within `1..=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    query: Option<String>,
    filters: BTreeMap<String, Vec<String>>,
    page: u32,
    per_page: u32,
    sort: String,
    order: SortOrder,
}

impl SearchParams {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Out-of-range page numbers and sizes are clamped into bounds.
    pub fn new(page: u32, per_page: u32, sort: impl Into<String>, order: SortOrder) -> Self {
        Self {
            query: None,
            filters: BTreeMap::new(),
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
            sort: sort.into(),
            order,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into();
        let trimmed = query.trim();
        self.query = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_filter<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let name = name.into();
        if values.is_empty() {
            self.filters.remove(&name);
        } else {
            self.filters.insert(name, values);
        }
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn filters(&self) -> &BTreeMap<String, Vec<String>> {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn sort(&self) -> &str {
        &self.sort
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Link template that reproduces these parameters with a different page number.
    pub fn link_template(&self, schema: &SearchSchema, path: impl Into<String>) -> LinkTemplate {
        let mut params = Vec::new();
        if let Some(query) = &self.query {
            params.push((schema.query_key.to_string(), query.clone()));
        }
        for (name, values) in &self.filters {
            for value in values {
                params.push((name.clone(), value.clone()));
            }
        }
        if self.sort != schema.default_sort || self.order != schema.default_order {
            params.push(("sort".to_string(), self.sort.clone()));
            params.push(("order".to_string(), self.order.to_string()));
        }
        LinkTemplate::new(path, schema.per_page_key, self.per_page, params)
    }
}

impl SearchSchema {
    /// Validate raw query values. Unknown keys are ignored; empty values count as absent.
    pub fn parse(&self, raw: &QueryParams) -> Result<SearchParams, Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        let page = self.parse_number(raw, "page", 1, &mut errors, |n| {
            if n < 1 {
                Some("page must be ≥ 1".to_string())
            } else if n > i64::from(u32::MAX) {
                Some(format!("page must be ≤ {}", u32::MAX))
            } else {
                None
            }
        });
        let per_page_key = self.per_page_key;
        let per_page = self.parse_number(raw, per_page_key, self.default_per_page, &mut errors, |n| {
            if n < 1 {
                Some(format!("{per_page_key} must be ≥ 1"))
            } else if n > i64::from(SearchParams::MAX_PER_PAGE) {
                Some(format!("{per_page_key} must be ≤ {}", SearchParams::MAX_PER_PAGE))
            } else {
                None
            }
        });

        let sort = match raw.get("sort") {
            Some(sort) if self.sortable.contains(&sort) => sort,
            Some(sort) => {
                if self.strict {
                    errors.push("sort", format!("sort must be one of: {}", self.sortable.join(", ")));
                }
                tracing::debug!(sort, "ignoring unsupported sort field");
                self.default_sort
            }
            None => self.default_sort,
        };

        let order = match raw.get("order").map(SortOrder::from_str) {
            Some(Ok(order)) => order,
            Some(Err(message)) => {
                if self.strict {
                    errors.push("order", message);
                }
                self.default_order
            }
            None => self.default_order,
        };

        errors.into_result()?;

        let mut params = SearchParams::new(page, per_page, sort, order);
        if let Some(query) = raw.get(self.query_key) {
            params = params.with_query(query);
        }
        for filter in self.filters {
            let values: Vec<&str> = if filter.multi {
                raw.get_all(filter.name)
            } else {
                raw.get(filter.name).into_iter().collect()
            };
            let values: Vec<&str> = values
                .into_iter()
                .filter(|v| filter.wildcard.is_none_or(|w| !v.eq_ignore_ascii_case(w)))
                .collect();
            params = params.with_filter(filter.name, values);
        }
        Ok(params)
    }

    /// Parse a numeric parameter. Lenient schemas fall back to the default and let
    /// [`SearchParams::new`] clamp; strict schemas record every problem.
    fn parse_number(
        &self,
        raw: &QueryParams,
        key: &str,
        default: u32,
        errors: &mut FieldErrors,
        check: impl Fn(i64) -> Option<String>,
    ) -> u32 {
        let Some(value) = raw.get(key) else {
            return default;
        };
        match value.parse::<i64>() {
            Ok(n) => {
                if let Some(message) = check(n) {
                    if self.strict {
                        errors.push(key, message);
                    }
                }
                u32::try_from(n.max(0)).unwrap_or(u32::MAX)
            }
            Err(_) => {
                if self.strict {
                    errors.push(key, format!("{key} must be an integer"));
                }
                default
            }
        }
    }
}

/// OpenAPI description of the law-firm search query string.
#[allow(dead_code)]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LawFirmSearchQuery {
    /// Case-insensitive substring match on name and description
    pub q: Option<String>,
    /// Exact (case-insensitive) city
    pub city: Option<String>,
    /// Specialization codes; repeat the key to match any of several
    pub specializations: Option<Vec<String>>,
    #[param(default = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub per_page: Option<u32>,
    /// One of: name, city, founded_date, created_at, updated_at
    #[param(default = "name")]
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
}

/// OpenAPI description of the admin user list query string.
#[allow(dead_code)]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    #[param(default = 1, minimum = 1)]
    pub page: Option<u32>,
    #[param(default = 50, minimum = 1, maximum = 100)]
    pub limit: Option<u32>,
    /// client, operator, lawyer, admin or all
    pub role: Option<String>,
    /// active, inactive or all
    pub status: Option<String>,
    /// Case-insensitive substring match on email and full name
    pub search: Option<String>,
}
