//! Repository layer for database operations

pub mod books;
pub mod copies;
pub mod filters;
pub mod libraries;
pub mod users;

pub use copies::CopyLedger;

use sqlx::{Pool, Postgres};

use crate::error::AppResult;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub libraries: libraries::LibrariesRepository,
    pub books: books::BooksRepository,
    pub copies: copies::CopiesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            libraries: libraries::LibrariesRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            copies: copies::CopiesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Turn a unique-constraint violation into a `Conflict` with a readable message
pub(crate) fn unique_violation_as_conflict(err: sqlx::Error, message: &str) -> crate::error::AppError {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            crate::error::AppError::Conflict(message.to_string())
        }
        other => other.into(),
    }
}
