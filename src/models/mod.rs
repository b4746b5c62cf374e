//! Data models for Booklend

pub mod book;
pub mod copy;
pub mod lending;
pub mod library;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookQuery};
pub use copy::BookCopy;
pub use lending::AvailableAction;
pub use library::{Library, LibraryQuery};
pub use pagination::{Page, PaginatedResponse};
pub use user::{User, UserClaims};
