//! Availability engine: borrow/return eligibility and state transitions
//!
//! The engine only sees the copy ledger. Lookups of libraries and books by
//! their public identifiers happen before it is called.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::lending::AvailableAction,
    repository::CopyLedger,
};

#[derive(Clone)]
pub struct AvailabilityEngine {
    ledger: Arc<dyn CopyLedger>,
}

impl AvailabilityEngine {
    pub fn new(ledger: Arc<dyn CopyLedger>) -> Self {
        Self { ledger }
    }

    /// Next action for the user on this book at this library
    pub async fn available_action(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
    ) -> AppResult<AvailableAction> {
        let copies = self.ledger.copies_at(book_id, library_id).await?;
        Ok(AvailableAction::resolve(&copies, user_id))
    }

    /// Borrow any free copy of the book at the library
    pub async fn borrow(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
    ) -> AppResult<AvailableAction> {
        let copy = self
            .ledger
            .claim_free_copy(book_id, library_id, user_id, Utc::now())
            .await?
            .ok_or_else(|| {
                tracing::warn!(book_id, library_id, user_id, "Borrow refused: no free copy");
                AppError::NoCopyAvailable("No copies available for this book".to_string())
            })?;

        tracing::info!(copy_id = copy.id, book_id, library_id, user_id, "Copy borrowed");
        self.available_action(book_id, library_id, user_id).await
    }

    /// Return a copy of the book the user holds at the library
    pub async fn return_to_library(
        &self,
        book_id: i32,
        library_id: i32,
        user_id: i32,
    ) -> AppResult<AvailableAction> {
        let copy = self
            .ledger
            .release_held_copy(book_id, library_id, user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(book_id, library_id, user_id, "Return refused: no borrowed copy");
                AppError::NoBorrowedCopy("You have not borrowed this book here".to_string())
            })?;

        tracing::info!(copy_id = copy.id, book_id, library_id, user_id, "Copy returned");
        self.available_action(book_id, library_id, user_id).await
    }

    /// Borrow one specific copy
    pub async fn borrow_copy(&self, copy_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        // Missing copy is a 404, not a domain refusal
        self.ledger.get_copy(copy_id).await?;

        let Some(copy) = self.ledger.claim_copy(copy_id, user_id, Utc::now()).await? else {
            // Removed since the lookup
            self.ledger.get_copy(copy_id).await?;
            tracing::warn!(copy_id, user_id, "Borrow refused: copy already borrowed");
            return Err(AppError::NoCopyAvailable("This copy is already borrowed".to_string()));
        };

        tracing::info!(copy_id, user_id, "Copy borrowed");
        self.available_action(copy.book_id, copy.library_id, user_id).await
    }

    /// Return one specific copy held by the user
    pub async fn return_copy(&self, copy_id: i32, user_id: i32) -> AppResult<AvailableAction> {
        self.ledger.get_copy(copy_id).await?;

        let Some(copy) = self.ledger.release_copy(copy_id, user_id).await? else {
            self.ledger.get_copy(copy_id).await?;
            tracing::warn!(copy_id, user_id, "Return refused: copy not held by user");
            return Err(AppError::NoBorrowedCopy("You have not borrowed this copy".to_string()));
        };

        tracing::info!(copy_id, user_id, "Copy returned");
        self.available_action(copy.book_id, copy.library_id, user_id).await
    }
}
