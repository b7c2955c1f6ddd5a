//! API route handlers, organized by resource
//!
//! - `health`: Health check endpoint
//! - `auth`: Signup, signin, and profile
//! - `community`: Community creation and listings
//! - `role`: Role creation and listing
//! - `member`: Membership addition and removal

use serde::Deserialize;

use crate::response::Meta;

pub mod auth;
pub mod community;
pub mod health;
pub mod member;
pub mod role;

/// Pagination query parameters for list endpoints
///
/// `page` defaults to 1 and `perPage` to 10; zero and negative values fall
/// back to the defaults.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,

    #[serde(rename = "perPage")]
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        match self.page {
            Some(p) if p >= 1 => p,
            _ => 1,
        }
    }

    pub fn per_page(&self) -> i64 {
        match self.per_page {
            Some(p) if p >= 1 => p,
            _ => 10,
        }
    }

    /// Row limit for the underlying query
    pub fn limit(&self) -> i64 {
        self.per_page()
    }

    /// Row offset for the underlying query
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }

    /// Pagination meta for a listing with `total` rows overall
    ///
    /// `pages` is `ceil(total / perPage)`.
    pub fn meta(&self, total: i64) -> Meta {
        let per_page = self.per_page();
        Meta::Page {
            total,
            pages: (total + per_page - 1) / per_page,
            page: self.page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, per_page: Option<i64>) -> PageQuery {
        PageQuery { page, per_page }
    }

    #[test]
    fn test_defaults() {
        let q = query(None, None);
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), 10);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_zero_and_negative_fall_back_to_defaults() {
        let q = query(Some(0), Some(-3));
        assert_eq!(q.page(), 1);
        assert_eq!(q.per_page(), 10);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let q = query(Some(2), Some(2));
        assert_eq!(q.limit(), 2);
        assert_eq!(q.offset(), 2);
    }

    #[test]
    fn test_pages_rounds_up() {
        let q = query(Some(2), Some(2));
        let Meta::Page { total, pages, page } = q.meta(5) else {
            panic!("expected page meta");
        };
        assert_eq!(total, 5);
        assert_eq!(pages, 3);
        assert_eq!(page, 2);
    }

    #[test]
    fn test_pages_for_empty_listing() {
        let q = query(None, None);
        let Meta::Page { pages, .. } = q.meta(0) else {
            panic!("expected page meta");
        };
        assert_eq!(pages, 0);
    }
}
