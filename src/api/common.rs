//! Common API utilities and shared types

use serde::Deserialize;

use crate::models::{PageRequest, SortDirection};

/// Default page number (1-indexed)
pub fn default_page_number() -> i64 {
    1
}

/// Default page size
pub fn default_page_size() -> i64 {
    10
}

/// Pagination query parameters shared by every list endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl PaginationQuery {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
            .with_sort(self.sort_by.clone(), self.sort_direction)
    }
}

/// Blog list query: pagination plus a name search term
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListQuery {
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub search_name_term: Option<String>,
}

impl BlogListQuery {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
            .with_sort(self.sort_by.clone(), self.sort_direction)
    }
}

/// User list query: pagination plus login/email search terms
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub search_login_term: Option<String>,
    #[serde(default)]
    pub search_email_term: Option<String>,
}

impl UserListQuery {
    pub fn to_page_request(&self) -> PageRequest {
        PageRequest::new(self.page_number, self.page_size)
            .with_sort(self.sort_by.clone(), self.sort_direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_query_defaults() {
        let query: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page_number, 1);
        assert_eq!(query.page_size, 10);
        assert!(query.sort_by.is_none());
        assert_eq!(query.sort_direction, SortDirection::Desc);
    }

    #[test]
    fn test_camel_case_wire_names() {
        let query: PaginationQuery = serde_json::from_str(
            r#"{"pageNumber": 2, "pageSize": 5, "sortBy": "name", "sortDirection": "asc"}"#,
        )
        .unwrap();
        assert_eq!(query.page_number, 2);
        assert_eq!(query.page_size, 5);
        assert_eq!(query.sort_by.as_deref(), Some("name"));
        assert_eq!(query.sort_direction, SortDirection::Asc);
    }

    #[test]
    fn test_to_page_request_clamps() {
        let query: PaginationQuery =
            serde_json::from_str(r#"{"pageNumber": 0, "pageSize": 5000}"#).unwrap();
        let request = query.to_page_request();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 100);
    }
}
