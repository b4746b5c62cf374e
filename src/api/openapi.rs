//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, copies, frontend, health, libraries, profile, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Booklend API",
        version = "1.0.0",
        description = "Book lending REST API for shared libraries",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Front end
        frontend::get_config,
        // Auth
        auth::login,
        profile::get_profile,
        profile::get_my_books,
        users::create_user,
        // Libraries
        libraries::list_libraries,
        libraries::get_library,
        libraries::create_library,
        libraries::update_library,
        libraries::delete_library,
        // Lending
        libraries::list_library_books,
        libraries::get_library_book_action,
        libraries::borrow_book,
        libraries::return_book,
        copies::borrow_copy,
        copies::return_copy,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::list_copies,
        // Copies
        copies::get_copy,
        copies::create_copy,
        copies::delete_copy,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::Profile,
            crate::models::user::CreateUser,
            // Libraries
            crate::models::library::Library,
            crate::models::library::LibraryDetails,
            crate::models::library::CreateLibrary,
            crate::models::library::UpdateLibrary,
            crate::models::pagination::PaginatedLibraries,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::pagination::PaginatedBooks,
            // Copies
            crate::models::copy::BookCopy,
            crate::models::copy::CopyDetails,
            crate::models::copy::BorrowedCopy,
            crate::models::copy::CreateCopy,
            // Lending
            crate::models::lending::AvailableAction,
            crate::models::lending::ActionResponse,
            crate::models::lending::LibraryBook,
            crate::models::pagination::PaginatedLibraryBooks,
            // Misc
            frontend::FrontendConfigResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "frontend", description = "Front-end configuration"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "profile", description = "Current user"),
        (name = "users", description = "User accounts"),
        (name = "libraries", description = "Library management"),
        (name = "books", description = "Catalog management"),
        (name = "copies", description = "Copy inventory"),
        (name = "lending", description = "Borrow and return")
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by secured paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_lending_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/libraries/{slug}/books/{id}/borrow"));
        assert!(paths.contains_key("/libraries/{slug}/books/{id}/return"));
        assert!(paths.contains_key("/copies/{id}/borrow"));
        assert!(paths.contains_key("/copies/{id}/return"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
