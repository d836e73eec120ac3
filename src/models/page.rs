//! Pagination types
//!
//! Shared pagination request/response types used by every list endpoint.
//! The response envelope serializes in the wire's camelCase shape.

use serde::{Deserialize, Serialize};

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// SQL keyword for this direction
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Normalized pagination parameters for repository queries
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: i64,
    /// Number of items per page
    pub page_size: i64,
    /// Requested sort field; repositories whitelist it per entity
    pub sort_by: Option<String>,
    /// Sort direction
    pub sort_direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            sort_by: None,
            sort_direction: SortDirection::Desc,
        }
    }
}

impl PageRequest {
    /// Create pagination parameters, clamping to sane bounds
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, 100),
            ..Self::default()
        }
    }

    /// Set the sort field
    pub fn with_sort(mut self, sort_by: Option<String>, direction: SortDirection) -> Self {
        self.sort_by = sort_by;
        self.sort_direction = direction;
        self
    }

    /// Offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Limit for database queries
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paginated result envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Total number of pages
    pub pages_count: i64,
    /// Current page number (1-indexed)
    pub page: i64,
    /// Number of items per page
    pub page_size: i64,
    /// Total number of items across all pages
    pub total_count: i64,
    /// Items in the current page
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    /// Build the envelope; `pages_count` is derived from the total
    pub fn new(items: Vec<T>, total_count: i64, request: &PageRequest) -> Self {
        let pages_count = if request.page_size > 0 {
            (total_count + request.page_size - 1) / request.page_size
        } else {
            0
        };
        Self {
            pages_count,
            page: request.page,
            page_size: request.page_size,
            total_count,
            items,
        }
    }

    /// Map items into another representation, keeping the envelope
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            pages_count: self.pages_count,
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_bounds() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 1);

        let request = PageRequest::new(3, 1000);
        assert_eq!(request.page, 3);
        assert_eq!(request.page_size, 100);
    }

    #[test]
    fn test_offset_and_limit() {
        let request = PageRequest::new(3, 10);
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_pages_count_rounds_up() {
        let request = PageRequest::new(1, 10);
        let paged = Paginated::new(vec![1, 2, 3], 21, &request);
        assert_eq!(paged.pages_count, 3);
        assert_eq!(paged.total_count, 21);
    }

    #[test]
    fn test_empty_result() {
        let request = PageRequest::new(1, 10);
        let paged: Paginated<i32> = Paginated::new(vec![], 0, &request);
        assert_eq!(paged.pages_count, 0);
        assert!(paged.items.is_empty());
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let request = PageRequest::new(1, 10);
        let paged = Paginated::new(vec![1], 1, &request);
        let json = serde_json::to_value(&paged).unwrap();
        assert!(json.get("pagesCount").is_some());
        assert!(json.get("totalCount").is_some());
        assert!(json.get("pageSize").is_some());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// For any page size > 0, `pages_count == ceil(total / page_size)`.
        #[test]
        fn pages_count_is_ceiling_of_total(
            total in 0i64..100_000,
            page_size in 1i64..=100,
            page in 1i64..=1000,
        ) {
            let request = PageRequest::new(page, page_size);
            let paged: Paginated<i64> = Paginated::new(vec![], total, &request);

            let expected = (total + request.page_size - 1) / request.page_size;
            prop_assert_eq!(paged.pages_count, expected);
            prop_assert!(paged.pages_count * request.page_size >= total);
            prop_assert!((paged.pages_count - 1).max(0) * request.page_size <= total);
        }
    }
}
