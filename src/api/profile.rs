//! Current user endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{copy::BorrowedCopy, user::Profile},
    AppState,
};

use super::AuthenticatedUser;

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = Profile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Profile>> {
    let profile = state.services.users.profile(claims.user_id).await?;
    Ok(Json(profile))
}

/// List the copies the current user holds
#[utoipa::path(
    get,
    path = "/profile/books",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrowed copies", body = Vec<BorrowedCopy>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_my_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowedCopy>>> {
    let copies = state.services.users.borrowed_copies(claims.user_id).await?;
    Ok(Json(copies))
}
