//! Libraries repository for database operations

use std::collections::HashMap;

use sqlx::{Pool, Postgres, QueryBuilder};

use super::{
    filters::{FilterSet, TextFilter},
    unique_violation_as_conflict,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        library::{CreateLibrary, Library, LibraryDetails, UpdateLibrary},
        pagination::Page,
    },
};

/// Filters accepted by the library list
pub const LIBRARY_FILTERS: FilterSet = FilterSet::new(&[
    TextFilter { param: "name", column: "l.name" },
    TextFilter { param: "slug", column: "l.slug" },
]);

#[derive(Clone)]
pub struct LibrariesRepository {
    pool: Pool<Postgres>,
}

impl LibrariesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List libraries matching the given filter parameters
    pub async fn search(
        &self,
        params: &HashMap<String, String>,
        page: Page,
    ) -> AppResult<(Vec<Library>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM libraries l WHERE 1=1");
        LIBRARY_FILTERS.push_predicate(&mut count, params)?;
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new("SELECT l.id, l.slug, l.name FROM libraries l WHERE 1=1");
        LIBRARY_FILTERS.push_predicate(&mut select, params)?;
        select.push(" ORDER BY l.name, l.id LIMIT ");
        select.push_bind(page.limit());
        select.push(" OFFSET ");
        select.push_bind(page.offset());

        let libraries = select
            .build_query_as::<Library>()
            .fetch_all(&self.pool)
            .await?;

        Ok((libraries, total))
    }

    /// Get library by slug
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<Library> {
        sqlx::query_as::<_, Library>("SELECT id, slug, name FROM libraries WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Library '{}' not found", slug)))
    }

    /// Get library with inventory counters
    pub async fn get_details(&self, slug: &str) -> AppResult<LibraryDetails> {
        sqlx::query_as::<_, LibraryDetails>(
            r#"
            SELECT l.id, l.slug, l.name,
                   COUNT(DISTINCT c.book_id) AS books_count,
                   COUNT(c.id) AS copies_count,
                   COUNT(c.id) FILTER (WHERE c.user_id IS NULL) AS free_copies_count
            FROM libraries l
            LEFT JOIN book_copies c ON c.library_id = l.id
            WHERE l.slug = $1
            GROUP BY l.id
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Library '{}' not found", slug)))
    }

    /// Create a library
    pub async fn create(&self, data: &CreateLibrary) -> AppResult<Library> {
        sqlx::query_as::<_, Library>(
            "INSERT INTO libraries (slug, name) VALUES ($1, $2) RETURNING id, slug, name",
        )
        .bind(&data.slug)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation_as_conflict(e, "A library with this slug already exists"))
    }

    /// Update a library, absent fields are kept
    pub async fn update(&self, slug: &str, data: &UpdateLibrary) -> AppResult<Library> {
        sqlx::query_as::<_, Library>(
            r#"
            UPDATE libraries
            SET slug = COALESCE($1, slug), name = COALESCE($2, name)
            WHERE slug = $3
            RETURNING id, slug, name
            "#,
        )
        .bind(&data.slug)
        .bind(&data.name)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation_as_conflict(e, "A library with this slug already exists"))?
        .ok_or_else(|| AppError::NotFound(format!("Library '{}' not found", slug)))
    }

    /// Delete a library and its copies, refused while any copy is borrowed
    pub async fn delete(&self, slug: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM libraries l
            WHERE l.slug = $1
              AND NOT EXISTS (
                  SELECT 1 FROM book_copies c
                  WHERE c.library_id = l.id AND c.user_id IS NOT NULL
              )
            "#,
        )
        .bind(slug)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Either missing or still lending copies
            self.get_by_slug(slug).await?;
            return Err(AppError::Conflict(format!(
                "Library '{}' has borrowed copies",
                slug
            )));
        }
        Ok(())
    }
}
