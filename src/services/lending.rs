//! Lending service: resolves public identifiers and drives the availability engine

use crate::{
    error::AppResult,
    models::{
        book::LibraryBookQuery,
        lending::{AvailableAction, LibraryBook},
        pagination::{Page, PaginatedResponse},
    },
    repository::{filters, Repository},
};

use super::availability::AvailabilityEngine;

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
    engine: AvailabilityEngine,
}

impl LendingService {
    pub fn new(repository: Repository, engine: AvailabilityEngine) -> Self {
        Self { repository, engine }
    }

    /// Books with copies at a library, with the caller's action on each
    pub async fn library_books(
        &self,
        slug: &str,
        user_id: i32,
        query: &LibraryBookQuery,
    ) -> AppResult<PaginatedResponse<LibraryBook>> {
        let page = Page::new(query.page, query.per_page)?;
        let library = self.repository.libraries.get_by_slug(slug).await?;

        let params = filters::params([
            ("book_title", &query.book_title),
            ("book_author", &query.book_author),
        ]);
        let (rows, total) = self
            .repository
            .books
            .search_at_library(library.id, user_id, &params, page)
            .await?;

        Ok(PaginatedResponse::new(
            rows.into_iter().map(LibraryBook::from).collect(),
            total,
            page,
        ))
    }

    /// Current action on a book at a library
    pub async fn available_action(&self, slug: &str, book_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        let (book_id, library_id) = self.resolve(slug, book_id).await?;
        self.engine.available_action(book_id, library_id, user_id).await
    }

    /// Borrow a book at a library
    pub async fn borrow(&self, slug: &str, book_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        let (book_id, library_id) = self.resolve(slug, book_id).await?;
        self.engine.borrow(book_id, library_id, user_id).await
    }

    /// Return a book to a library
    pub async fn return_to_library(&self, slug: &str, book_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        let (book_id, library_id) = self.resolve(slug, book_id).await?;
        self.engine.return_to_library(book_id, library_id, user_id).await
    }

    /// Borrow a specific copy
    pub async fn borrow_copy(&self, copy_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        self.engine.borrow_copy(copy_id, user_id).await
    }

    /// Return a specific copy
    pub async fn return_copy(&self, copy_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        self.engine.return_copy(copy_id, user_id).await
    }

    /// Library slug and book ID to row IDs, 404 when either is unknown
    async fn resolve(&self, slug: &str, book_id: i32) -> AppResult<(i32, i32)> {
        let library = self.repository.libraries.get_by_slug(slug).await?;
        let book = self.repository.books.get_by_id(book_id).await?;
        Ok((book.id, library.id))
    }
}
