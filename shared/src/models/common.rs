//! Pagination and small request bodies shared by several resources

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let pages = if limit > 0 {
            ((total as f64) / (limit as f64)).ceil() as u32
        } else {
            1
        };

        Self {
            items,
            pagination: Pagination {
                total,
                page,
                limit,
                pages,
            },
        }
    }
}

/// Clamp page/limit query values and compute the SQL offset
pub fn page_window(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> (u32, u32, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, 100);
    let offset = ((page - 1) as i64) * (limit as i64);
    (page, limit, offset)
}

/// Rejection body for leave and regularization reviews
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_response() {
        let items: Vec<i32> = (1..=10).collect();
        let resp = PaginatedResponse::new(items, 95, 2, 10);

        assert_eq!(resp.pagination.total, 95);
        assert_eq!(resp.pagination.page, 2);
        assert_eq!(resp.pagination.pages, 10);
        assert_eq!(resp.items.len(), 10);
    }

    #[test]
    fn test_page_window_defaults_and_clamps() {
        assert_eq!(page_window(None, None, 10), (1, 10, 0));
        assert_eq!(page_window(Some(3), Some(20), 10), (3, 20, 40));
        assert_eq!(page_window(Some(0), Some(1000), 10), (1, 100, 0));
    }
}
