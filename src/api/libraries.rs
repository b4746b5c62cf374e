//! Library endpoints, including borrow/return of a book within a library

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::LibraryBookQuery,
        lending::{ActionResponse, LibraryBook},
        library::{CreateLibrary, Library, LibraryDetails, LibraryQuery, UpdateLibrary},
        pagination::PaginatedResponse,
    },
    AppState,
};

use super::{AuthenticatedUser, ValidQuery};

/// List libraries
#[utoipa::path(
    get,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(LibraryQuery),
    responses(
        (status = 200, description = "List of libraries", body = crate::models::pagination::PaginatedLibraries),
        (status = 400, description = "Invalid filter or pagination")
    )
)]
pub async fn list_libraries(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    ValidQuery(query): ValidQuery<LibraryQuery>,
) -> AppResult<Json<PaginatedResponse<Library>>> {
    let libraries = state.services.catalog.search_libraries(&query).await?;
    Ok(Json(libraries))
}

/// Get library details by slug
#[utoipa::path(
    get,
    path = "/libraries/{slug}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Library slug")),
    responses(
        (status = 200, description = "Library details", body = LibraryDetails),
        (status = 404, description = "Library not found")
    )
)]
pub async fn get_library(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(slug): Path<String>,
) -> AppResult<Json<LibraryDetails>> {
    let library = state.services.catalog.get_library(&slug).await?;
    Ok(Json(library))
}

/// Create a library
#[utoipa::path(
    post,
    path = "/libraries",
    tag = "libraries",
    security(("bearer_auth" = [])),
    request_body = CreateLibrary,
    responses(
        (status = 201, description = "Library created", body = Library),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Staff only"),
        (status = 409, description = "Slug already used")
    )
)]
pub async fn create_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateLibrary>,
) -> AppResult<(StatusCode, Json<Library>)> {
    claims.require_staff()?;
    let library = state.services.catalog.create_library(data).await?;
    Ok((StatusCode::CREATED, Json(library)))
}

/// Update a library
#[utoipa::path(
    put,
    path = "/libraries/{slug}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Library slug")),
    request_body = UpdateLibrary,
    responses(
        (status = 200, description = "Library updated", body = Library),
        (status = 404, description = "Library not found"),
        (status = 409, description = "Slug already used")
    )
)]
pub async fn update_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(slug): Path<String>,
    Json(data): Json<UpdateLibrary>,
) -> AppResult<Json<Library>> {
    claims.require_staff()?;
    let library = state.services.catalog.update_library(&slug, data).await?;
    Ok(Json(library))
}

/// Delete a library and its copies
#[utoipa::path(
    delete,
    path = "/libraries/{slug}",
    tag = "libraries",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Library slug")),
    responses(
        (status = 204, description = "Library deleted"),
        (status = 404, description = "Library not found"),
        (status = 409, description = "Library has borrowed copies")
    )
)]
pub async fn delete_library(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;
    state.services.catalog.delete_library(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the books of a library with the caller's available action
#[utoipa::path(
    get,
    path = "/libraries/{slug}/books",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("slug" = String, Path, description = "Library slug"),
        LibraryBookQuery
    ),
    responses(
        (status = 200, description = "Books held by the library", body = crate::models::pagination::PaginatedLibraryBooks),
        (status = 404, description = "Library not found")
    )
)]
pub async fn list_library_books(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(slug): Path<String>,
    ValidQuery(query): ValidQuery<LibraryBookQuery>,
) -> AppResult<Json<PaginatedResponse<LibraryBook>>> {
    let books = state
        .services
        .lending
        .library_books(&slug, claims.user_id, &query)
        .await?;
    Ok(Json(books))
}

/// Get the caller's available action on a book at a library
#[utoipa::path(
    get,
    path = "/libraries/{slug}/books/{id}",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("slug" = String, Path, description = "Library slug"),
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Available action", body = ActionResponse),
        (status = 404, description = "Library or book not found")
    )
)]
pub async fn get_library_book_action(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((slug, book_id)): Path<(String, i32)>,
) -> AppResult<Json<ActionResponse>> {
    let action = state
        .services
        .lending
        .available_action(&slug, book_id, claims.user_id)
        .await?;
    Ok(Json(ActionResponse { action }))
}

/// Borrow a book at a library
#[utoipa::path(
    post,
    path = "/libraries/{slug}/books/{id}/borrow",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("slug" = String, Path, description = "Library slug"),
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book borrowed", body = ActionResponse),
        (status = 400, description = "No copies available", body = crate::error::ErrorResponse),
        (status = 404, description = "Library or book not found")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((slug, book_id)): Path<(String, i32)>,
) -> AppResult<Json<ActionResponse>> {
    let action = state
        .services
        .lending
        .borrow(&slug, book_id, claims.user_id)
        .await?;
    Ok(Json(ActionResponse { action }))
}

/// Return a book to a library
#[utoipa::path(
    post,
    path = "/libraries/{slug}/books/{id}/return",
    tag = "lending",
    security(("bearer_auth" = [])),
    params(
        ("slug" = String, Path, description = "Library slug"),
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ActionResponse),
        (status = 400, description = "Book not borrowed by the caller", body = crate::error::ErrorResponse),
        (status = 404, description = "Library or book not found")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((slug, book_id)): Path<(String, i32)>,
) -> AppResult<Json<ActionResponse>> {
    let action = state
        .services
        .lending
        .return_to_library(&slug, book_id, claims.user_id)
        .await?;
    Ok(Json(ActionResponse { action }))
}
