//! Book copy (physical instance at one library) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Copy row as stored. `user_id` and `borrow_date` are set together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: i32,
    pub book_id: i32,
    pub library_id: i32,
    /// Current borrower, `None` when the copy is on the shelf
    pub user_id: Option<i32>,
    pub borrow_date: Option<DateTime<Utc>>,
}

impl BookCopy {
    pub fn is_free(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn is_held_by(&self, user_id: i32) -> bool {
        self.user_id == Some(user_id)
    }

    /// Borrower and borrow date are both present or both absent
    pub fn is_consistent(&self) -> bool {
        self.user_id.is_some() == self.borrow_date.is_some()
    }
}

/// Copy with its library and borrower, for display
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CopyDetails {
    pub id: i32,
    pub book_id: i32,
    pub library_id: i32,
    pub library_slug: String,
    pub library_name: String,
    pub borrower_username: Option<String>,
    pub borrow_date: Option<DateTime<Utc>>,
}

/// Copy held by the current user ("my books")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowedCopy {
    pub copy_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub library_slug: String,
    pub library_name: String,
    pub book_id: i32,
    pub book_title: String,
    pub book_author: String,
    pub book_image_url: Option<String>,
}

/// Create copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCopy {
    pub book_id: i32,
    pub library_slug: String,
}
