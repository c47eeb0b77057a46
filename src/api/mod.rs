use serde::Serialize;
use utoipa::ToSchema;

pub mod attendance;
pub mod employee;

/// Page metadata shared by the list endpoints.
#[derive(Debug, Serialize, PartialEq, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 30)]
    pub limit: u32,
    #[schema(example = 42)]
    pub total: i64,
    #[schema(example = 2)]
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

pub fn build_pagination(page: u32, limit: u32, total: i64) -> Pagination {
    let total_pages = (total + limit as i64 - 1) / limit as i64;
    Pagination {
        page,
        limit,
        total,
        total_pages,
        has_next_page: (page as i64) < total_pages,
        has_previous_page: page > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_arithmetic() {
        let meta = build_pagination(2, 30, 61);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_previous_page);

        let last = build_pagination(3, 30, 61);
        assert!(!last.has_next_page);

        let exact = build_pagination(1, 30, 60);
        assert_eq!(exact.total_pages, 2);
        assert!(exact.has_next_page);
        assert!(!exact.has_previous_page);
    }

    #[test]
    fn pagination_with_no_rows() {
        let meta = build_pagination(1, 30, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }
}
