//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Catalog entry, independent of any library
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub subtitle: Option<String>,
    pub publisher: Option<String>,
    /// Free-form publication date as printed (e.g. `2015` or `2015-03-12`)
    pub publication_date: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub page_count: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1 to 255 characters"))]
    pub author: String,
    #[validate(length(max = 255))]
    pub subtitle: Option<String>,
    #[validate(length(max = 255))]
    pub publisher: Option<String>,
    #[validate(length(max = 32))]
    pub publication_date: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: Option<i32>,
}

/// Update book request, absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10 to 17 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1 to 255 characters"))]
    pub author: Option<String>,
    #[validate(length(max = 255))]
    pub subtitle: Option<String>,
    #[validate(length(max = 255))]
    pub publisher: Option<String>,
    #[validate(length(max = 32))]
    pub publication_date: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
    #[validate(range(min = 1, message = "Page count must be positive"))]
    pub page_count: Option<i32>,
}

/// Catalog query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Substring match on the title
    pub title: Option<String>,
    /// Substring match on the author
    pub author: Option<String>,
    /// Substring match on the ISBN
    pub isbn: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Query parameters for the books of one library
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LibraryBookQuery {
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
