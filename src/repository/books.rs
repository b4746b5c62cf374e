//! Books repository for database operations

use std::collections::HashMap;

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{
    filters::{FilterSet, TextFilter},
    unique_violation_as_conflict,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, CreateBook, UpdateBook},
        lending::LibraryBookRow,
        pagination::Page,
    },
};

/// Filters accepted by the catalog
pub const BOOK_FILTERS: FilterSet = FilterSet::new(&[
    TextFilter { param: "title", column: "b.title" },
    TextFilter { param: "author", column: "b.author" },
    TextFilter { param: "isbn", column: "b.isbn" },
]);

/// Filters accepted by the books of one library
pub const LIBRARY_BOOK_FILTERS: FilterSet = FilterSet::new(&[
    TextFilter { param: "book_title", column: "b.title" },
    TextFilter { param: "book_author", column: "b.author" },
]);

const BOOK_COLUMNS: &str = "b.id, b.isbn, b.title, b.author, b.subtitle, b.publisher, \
     b.publication_date, b.description, b.image_url, b.page_count, b.created_at";

const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Search the catalog
    pub async fn search(
        &self,
        params: &HashMap<String, String>,
        page: Page,
    ) -> AppResult<(Vec<Book>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b WHERE 1=1");
        BOOK_FILTERS.push_predicate(&mut count, params)?;
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM books b WHERE 1=1",
            BOOK_COLUMNS
        ));
        BOOK_FILTERS.push_predicate(&mut select, params)?;
        select.push(" ORDER BY b.title, b.id LIMIT ");
        select.push_bind(page.limit());
        select.push(" OFFSET ");
        select.push_bind(page.offset());

        let books = select.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Books having at least one copy at `library_id`, with counters relative to `user_id`
    pub async fn search_at_library(
        &self,
        library_id: i32,
        user_id: i32,
        params: &HashMap<String, String>,
        page: Page,
    ) -> AppResult<(Vec<LibraryBookRow>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(DISTINCT b.id) FROM books b \
             JOIN book_copies c ON c.book_id = b.id AND c.library_id = ",
        );
        count.push_bind(library_id);
        count.push(" WHERE 1=1");
        LIBRARY_BOOK_FILTERS.push_predicate(&mut count, params)?;
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            r#"
            SELECT b.id, b.isbn, b.title, b.author, b.subtitle, b.image_url,
                   COUNT(c.id) AS copies_count,
                   COUNT(c.id) FILTER (WHERE c.user_id IS NULL) AS free_copies_count,
                   COUNT(c.id) FILTER (WHERE c.user_id = "#,
        );
        select.push_bind(user_id);
        select.push(
            ") AS held_count FROM books b \
             JOIN book_copies c ON c.book_id = b.id AND c.library_id = ",
        );
        select.push_bind(library_id);
        select.push(" WHERE 1=1");
        LIBRARY_BOOK_FILTERS.push_predicate(&mut select, params)?;
        select.push(" GROUP BY b.id ORDER BY b.title, b.id LIMIT ");
        select.push_bind(page.limit());
        select.push(" OFFSET ");
        select.push_bind(page.offset());

        let rows = select
            .build_query_as::<LibraryBookRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books b WHERE b.id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Whether a book exists
    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create a book
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, title, author, subtitle, publisher,
                               publication_date, description, image_url, page_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, isbn, title, author, subtitle, publisher,
                      publication_date, description, image_url, page_count, created_at
            "#,
        )
        .bind(&data.isbn)
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.subtitle)
        .bind(&data.publisher)
        .bind(&data.publication_date)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.page_count)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_ISBN))
    }

    /// Update a book, absent fields are kept
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                isbn = COALESCE($1, isbn),
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                subtitle = COALESCE($4, subtitle),
                publisher = COALESCE($5, publisher),
                publication_date = COALESCE($6, publication_date),
                description = COALESCE($7, description),
                image_url = COALESCE($8, image_url),
                page_count = COALESCE($9, page_count)
            WHERE id = $10
            RETURNING id, isbn, title, author, subtitle, publisher,
                      publication_date, description, image_url, page_count, created_at
            "#,
        )
        .bind(&data.isbn)
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.subtitle)
        .bind(&data.publisher)
        .bind(&data.publication_date)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.page_count)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation_as_conflict(e, DUPLICATE_ISBN))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book and its copies, refused while any copy is borrowed
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM books b
            WHERE b.id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM book_copies c
                  WHERE c.book_id = b.id AND c.user_id IS NOT NULL
              )
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            if !self.exists(id).await? {
                return Err(AppError::NotFound(format!("Book with id {} not found", id)));
            }
            return Err(AppError::Conflict(format!("Book {} has borrowed copies", id)));
        }
        Ok(())
    }
}
