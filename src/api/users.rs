//! User account endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{CreateUser, Profile},
    AppState,
};

use super::AuthenticatedUser;

/// Create a user account (staff only)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = Profile),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<Profile>)> {
    claims.require_staff()?;
    let profile = state.services.users.create_user(data).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}
