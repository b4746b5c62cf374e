//! Library (physical location holding book copies) model

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Lowercase words separated by single dashes, e.g. `paris-office`
pub static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));

/// Library as listed (compact form)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Library {
    pub id: i32,
    /// Unique human-readable identifier used in URLs
    pub slug: String,
    pub name: String,
}

/// Library with inventory counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LibraryDetails {
    pub id: i32,
    pub slug: String,
    pub name: String,
    /// Distinct books with at least one copy here
    pub books_count: i64,
    pub copies_count: i64,
    /// Copies currently on the shelf
    pub free_copies_count: i64,
}

/// Create library request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLibrary {
    #[validate(
        length(min = 1, max = 50, message = "Slug must be 1 to 50 characters"),
        regex(path = *SLUG_REGEX, message = "Slug may only contain lowercase letters, digits and dashes")
    )]
    pub slug: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
}

/// Update library request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateLibrary {
    #[validate(
        length(min = 1, max = 50, message = "Slug must be 1 to 50 characters"),
        regex(path = *SLUG_REGEX, message = "Slug may only contain lowercase letters, digits and dashes")
    )]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,
}

/// Library list query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LibraryQuery {
    /// Substring match on the library name
    pub name: Option<String>,
    /// Substring match on the slug
    pub slug: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
