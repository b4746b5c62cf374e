//! Pagination parameters and paginated response wrapper

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

use super::{book::Book, library::Library, lending::LibraryBook};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl Page {
    /// Build a page window from raw query values, applying defaults
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> AppResult<Self> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        if (page - 1).checked_mul(per_page).is_none() {
            return Err(AppError::Validation("page is out of range".to_string()));
        }

        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    PaginatedBooks = PaginatedResponse<Book>,
    PaginatedLibraries = PaginatedResponse<Library>,
    PaginatedLibraryBooks = PaginatedResponse<LibraryBook>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Entries on this page
    pub items: Vec<T>,
    /// Total number of matching entries
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Entries per page
    pub per_page: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        }
    }
}
