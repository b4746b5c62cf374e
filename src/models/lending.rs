//! Lending state: the next action a user can take on a book at a library

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::copy::BookCopy;

/// Next valid user action for a (book, library, user) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AvailableAction {
    /// A free copy exists and the user holds none
    Borrow,
    /// The user holds a copy
    Return,
    /// Every copy is held by someone else
    None,
}

impl AvailableAction {
    /// Decide from the number of copies held by the user and the number of free copies
    pub fn from_counts(held_by_user: i64, free: i64) -> Self {
        if held_by_user > 0 {
            AvailableAction::Return
        } else if free > 0 {
            AvailableAction::Borrow
        } else {
            AvailableAction::None
        }
    }

    /// Decide from the copies of one book at one library
    pub fn resolve(copies: &[BookCopy], user_id: i32) -> Self {
        let held = copies.iter().filter(|c| c.is_held_by(user_id)).count();
        let free = copies.iter().filter(|c| c.is_free()).count();
        Self::from_counts(held as i64, free as i64)
    }
}

/// Borrow/return response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub action: AvailableAction,
}

/// Book row as seen from one library, before the action is derived
#[derive(Debug, Clone, FromRow)]
pub struct LibraryBookRow {
    pub id: i32,
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub copies_count: i64,
    pub free_copies_count: i64,
    pub held_count: i64,
}

/// Book as seen from one library by the current user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LibraryBook {
    pub id: i32,
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub copies_count: i64,
    pub free_copies_count: i64,
    pub action: AvailableAction,
}

impl From<LibraryBookRow> for LibraryBook {
    fn from(row: LibraryBookRow) -> Self {
        Self {
            action: AvailableAction::from_counts(row.held_count, row.free_copies_count),
            id: row.id,
            isbn: row.isbn,
            title: row.title,
            author: row.author,
            subtitle: row.subtitle,
            image_url: row.image_url,
            copies_count: row.copies_count,
            free_copies_count: row.free_copies_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn copy(id: i32, user_id: Option<i32>) -> BookCopy {
        BookCopy {
            id,
            book_id: 1,
            library_id: 1,
            user_id,
            borrow_date: user_id.map(|_| Utc::now()),
        }
    }

    #[test]
    fn test_resolve() {
        let copies = vec![copy(1, Some(10)), copy(2, None)];
        assert_eq!(AvailableAction::resolve(&copies, 10), AvailableAction::Return);
        assert_eq!(AvailableAction::resolve(&copies, 11), AvailableAction::Borrow);

        let copies = vec![copy(1, Some(10)), copy(2, Some(11))];
        assert_eq!(AvailableAction::resolve(&copies, 12), AvailableAction::None);
        assert_eq!(AvailableAction::resolve(&[], 12), AvailableAction::None);
    }

    #[test]
    fn test_holding_wins_over_free_copies() {
        assert_eq!(AvailableAction::from_counts(1, 3), AvailableAction::Return);
        assert_eq!(AvailableAction::from_counts(0, 3), AvailableAction::Borrow);
        assert_eq!(AvailableAction::from_counts(0, 0), AvailableAction::None);
    }

    #[test]
    fn test_wire_format() {
        let body = serde_json::to_value(ActionResponse { action: AvailableAction::Return }).unwrap();
        assert_eq!(body, serde_json::json!({ "action": "RETURN" }));
        assert_eq!(serde_json::to_value(AvailableAction::None).unwrap(), "NONE");
        assert_eq!(serde_json::to_value(AvailableAction::Borrow).unwrap(), "BORROW");
    }

    #[test]
    fn test_library_book_from_row() {
        let row = LibraryBookRow {
            id: 3,
            isbn: None,
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            subtitle: None,
            image_url: None,
            copies_count: 2,
            free_copies_count: 0,
            held_count: 0,
        };
        let book = LibraryBook::from(row);
        assert_eq!(book.action, AvailableAction::None);
        assert_eq!(book.copies_count, 2);
    }
}
