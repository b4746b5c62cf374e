//! Copy endpoints: inventory management and borrow/return by copy ID

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        copy::{BookCopy, CopyDetails, CreateCopy},
        lending::ActionResponse,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Get copy by ID
#[utoipa::path(
    get,
    path = "/copies/{id}",
    tag = "copies",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy details", body = CopyDetails),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn get_copy(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CopyDetails>> {
    let copy = state.services.catalog.get_copy(id).await?;
    Ok(Json(copy))
}

/// Add a copy of a book to a library
#[utoipa::path(
    post,
    path = "/copies",
    tag = "copies",
    security(("bearer_auth" = [])),
    request_body = CreateCopy,
    responses(
        (status = 201, description = "Copy created", body = BookCopy),
        (status = 403, description = "Staff only"),
        (status = 404, description = "Book or library not found")
    )
)]
pub async fn create_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateCopy>,
) -> AppResult<(StatusCode, Json<BookCopy>)> {
    claims.require_staff()?;
    let copy = state.services.catalog.create_copy(data).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

/// Remove a copy
#[utoipa::path(
    delete,
    path = "/copies/{id}",
    tag = "copies",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 204, description = "Copy removed"),
        (status = 404, description = "Copy not found"),
        (status = 409, description = "Copy is borrowed")
    )
)]
pub async fn delete_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_copy(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Borrow a specific copy
#[utoipa::path(
    post,
    path = "/copies/{id}/borrow",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy borrowed", body = ActionResponse),
        (status = 400, description = "Copy already borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn borrow_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse>> {
    let action = state.services.lending.borrow_copy(id, claims.user_id).await?;
    Ok(Json(ActionResponse { action }))
}

/// Return a specific copy
#[utoipa::path(
    post,
    path = "/copies/{id}/return",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy returned", body = ActionResponse),
        (status = 400, description = "Copy not borrowed by the caller", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn return_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ActionResponse>> {
    let action = state.services.lending.return_copy(id, claims.user_id).await?;
    Ok(Json(ActionResponse { action }))
}
