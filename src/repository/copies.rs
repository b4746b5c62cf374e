//! Book copies repository and the copy ledger used by the lending engine

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::copy::{BookCopy, BorrowedCopy, CopyDetails},
};

/// Storage operations the availability engine relies on.
///
/// Every `claim_*`/`release_*` call is a single atomic read-modify-write: it
/// returns the updated copy, or `None` when no copy satisfied the condition,
/// in which case nothing was modified.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CopyLedger: Send + Sync {
    /// Copy by ID
    async fn get_copy(&self, copy_id: i32) -> AppResult<BookCopy>;

    /// All copies of a book at a library
    async fn copies_at(&self, book_id: i32, library_id: i32) -> AppResult<Vec<BookCopy>>;

    /// Hand any free copy of the book at the library to `user_id`
    async fn claim_free_copy(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<BookCopy>>;

    /// Hand this copy to `user_id` if it is free
    async fn claim_copy(
        &self,
        copy_id: i32,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<BookCopy>>;

    /// Put back a copy of the book held by `user_id` at the library
    async fn release_held_copy(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
    ) -> AppResult<Option<BookCopy>>;

    /// Put back this copy if `user_id` holds it
    async fn release_copy(&self, copy_id: i32, user_id: i32) -> AppResult<Option<BookCopy>>;
}

const COPY_COLUMNS: &str = "id, book_id, library_id, user_id, borrow_date";

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Copy with library and borrower
    pub async fn get_details(&self, copy_id: i32) -> AppResult<CopyDetails> {
        sqlx::query_as::<_, CopyDetails>(
            r#"
            SELECT c.id, c.book_id, c.library_id,
                   l.slug AS library_slug, l.name AS library_name,
                   u.username AS borrower_username, c.borrow_date
            FROM book_copies c
            JOIN libraries l ON l.id = c.library_id
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.id = $1
            "#,
        )
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", copy_id)))
    }

    /// Copies of a book across all libraries
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<CopyDetails>> {
        let copies = sqlx::query_as::<_, CopyDetails>(
            r#"
            SELECT c.id, c.book_id, c.library_id,
                   l.slug AS library_slug, l.name AS library_name,
                   u.username AS borrower_username, c.borrow_date
            FROM book_copies c
            JOIN libraries l ON l.id = c.library_id
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.book_id = $1
            ORDER BY l.name, c.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Copies currently held by a user
    pub async fn borrowed_by_user(&self, user_id: i32) -> AppResult<Vec<BorrowedCopy>> {
        let copies = sqlx::query_as::<_, BorrowedCopy>(
            r#"
            SELECT c.id AS copy_id, c.borrow_date,
                   l.slug AS library_slug, l.name AS library_name,
                   b.id AS book_id, b.title AS book_title, b.author AS book_author,
                   b.image_url AS book_image_url
            FROM book_copies c
            JOIN libraries l ON l.id = c.library_id
            JOIN books b ON b.id = c.book_id
            WHERE c.user_id = $1
            ORDER BY c.borrow_date DESC, c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Number of copies currently held by a user
    pub async fn count_borrowed_by_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_copies WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Add a copy of a book to a library, on the shelf
    pub async fn create(&self, book_id: i32, library_id: i32) -> AppResult<BookCopy> {
        let copy = sqlx::query_as::<_, BookCopy>(&format!(
            "INSERT INTO book_copies (book_id, library_id) VALUES ($1, $2) RETURNING {}",
            COPY_COLUMNS
        ))
        .bind(book_id)
        .bind(library_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(copy)
    }

    /// Remove a copy, refused while it is borrowed
    pub async fn delete(&self, copy_id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_copies WHERE id = $1 AND user_id IS NULL")
            .bind(copy_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            self.get_copy(copy_id).await?;
            return Err(AppError::Conflict(format!(
                "Copy {} is borrowed and cannot be removed",
                copy_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CopyLedger for CopiesRepository {
    async fn get_copy(&self, copy_id: i32) -> AppResult<BookCopy> {
        sqlx::query_as::<_, BookCopy>(&format!(
            "SELECT {} FROM book_copies WHERE id = $1",
            COPY_COLUMNS
        ))
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Copy with id {} not found", copy_id)))
    }

    async fn copies_at(&self, book_id: i32, library_id: i32) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(&format!(
            "SELECT {} FROM book_copies WHERE book_id = $1 AND library_id = $2 ORDER BY id",
            COPY_COLUMNS
        ))
        .bind(book_id)
        .bind(library_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    async fn claim_free_copy(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<BookCopy>> {
        // Concurrent borrowers skip rows already locked by each other
        let copy = sqlx::query_as::<_, BookCopy>(&format!(
            r#"
            UPDATE book_copies SET user_id = $3, borrow_date = $4
            WHERE user_id IS NULL AND id = (
                SELECT id FROM book_copies
                WHERE book_id = $1 AND library_id = $2 AND user_id IS NULL
                ORDER BY id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {}
            "#,
            COPY_COLUMNS
        ))
        .bind(book_id)
        .bind(library_id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(copy)
    }

    async fn claim_copy(
        &self,
        copy_id: i32,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(&format!(
            r#"
            UPDATE book_copies SET user_id = $2, borrow_date = $3
            WHERE id = $1 AND user_id IS NULL
            RETURNING {}
            "#,
            COPY_COLUMNS
        ))
        .bind(copy_id)
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(copy)
    }

    async fn release_held_copy(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
    ) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(&format!(
            r#"
            UPDATE book_copies SET user_id = NULL, borrow_date = NULL
            WHERE user_id = $3 AND id = (
                SELECT id FROM book_copies
                WHERE book_id = $1 AND library_id = $2 AND user_id = $3
                ORDER BY borrow_date, id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {}
            "#,
            COPY_COLUMNS
        ))
        .bind(book_id)
        .bind(library_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(copy)
    }

    async fn release_copy(&self, copy_id: i32, user_id: i32) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>(&format!(
            r#"
            UPDATE book_copies SET user_id = NULL, borrow_date = NULL
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            COPY_COLUMNS
        ))
        .bind(copy_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(copy)
    }
}
