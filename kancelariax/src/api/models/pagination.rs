//! Page-number pagination metadata shared by all list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Derived pagination metadata for one page of a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Number of records matching the query (before pagination)
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    /// `ceil(total / per_page)`; zero for an empty result set
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    /// `per_page` of zero is treated as one.
    pub fn new(total: u64, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let pages = total.div_ceil(u64::from(per_page));
        Self {
            total,
            page,
            per_page,
            pages,
            has_next: u64::from(page) < pages,
            has_prev: page > 1,
        }
    }

    /// Last page number for navigation links; an empty set still has a first page.
    #[inline]
    pub fn last_page(&self) -> u64 {
        self.pages.max(1)
    }
}
