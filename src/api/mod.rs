//! API handlers for Booklend REST endpoints

pub mod auth;
pub mod books;
pub mod copies;
pub mod frontend;
pub mod health;
pub mod libraries;
pub mod openapi;
pub mod profile;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Query string extractor whose rejections use the JSON error body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Front end
        .route("/config", get(frontend::get_config))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/profile", get(profile::get_profile))
        .route("/profile/books", get(profile::get_my_books))
        .route("/users", post(users::create_user))
        // Libraries
        .route("/libraries", get(libraries::list_libraries).post(libraries::create_library))
        .route(
            "/libraries/:slug",
            get(libraries::get_library)
                .put(libraries::update_library)
                .delete(libraries::delete_library),
        )
        .route("/libraries/:slug/books", get(libraries::list_library_books))
        .route("/libraries/:slug/books/:id", get(libraries::get_library_book_action))
        .route("/libraries/:slug/books/:id/borrow", post(libraries::borrow_book))
        .route("/libraries/:slug/books/:id/return", post(libraries::return_book))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/copies", get(books::list_copies))
        // Copies
        .route("/copies", post(copies::create_copy))
        .route("/copies/:id", get(copies::get_copy).delete(copies::delete_copy))
        .route("/copies/:id/borrow", post(copies::borrow_copy))
        .route("/copies/:id/return", post(copies::return_copy))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, repository::Repository, services::Services};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// State over a pool that never connects; only routes that skip the store are exercised
    fn offline_state() -> AppState {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .min_connections(0)
            .connect_lazy(&config.database.url)
            .unwrap();
        let services = Services::new(Repository::new(pool), config.auth.clone());
        AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(offline_state())
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_frontend_config() {
        let response = create_router(offline_state())
            .oneshot(Request::get("/api/v1/config").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["site_title"], "Booklend");
        assert!(body["analytics_id"].is_null());
    }

    #[tokio::test]
    async fn test_borrow_requires_token() {
        let response = create_router(offline_state())
            .oneshot(
                Request::post("/api/v1/libraries/paris/books/1/borrow")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_rejects_malformed_header_and_bad_token() {
        let router = create_router(offline_state());

        let response = router
            .clone()
            .oneshot(
                Request::get("/api/v1/profile")
                    .header(AUTHORIZATION, "Token abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .oneshot(
                Request::get("/api/v1/profile")
                    .header(AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_catalog_writes_require_staff() {
        let state = offline_state();
        let claims = UserClaims {
            sub: "reader".into(),
            user_id: 7,
            is_staff: false,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = claims.create_token(&state.config.auth.jwt_secret).unwrap();

        let response = create_router(state)
            .oneshot(
                Request::post("/api/v1/libraries")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"slug":"lyon","name":"Lyon"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_pagination_rejected_before_store() {
        let state = offline_state();
        let claims = UserClaims {
            sub: "reader".into(),
            user_id: 7,
            is_staff: false,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = claims.create_token(&state.config.auth.jwt_secret).unwrap();

        let response = create_router(state)
            .oneshot(
                Request::get("/api/v1/books?per_page=1000")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "BadValue");
    }

    #[tokio::test]
    async fn test_malformed_pagination_uses_error_body() {
        let state = offline_state();
        let claims = UserClaims {
            sub: "reader".into(),
            user_id: 7,
            is_staff: false,
            exp: chrono::Utc::now().timestamp() + 3600,
            iat: chrono::Utc::now().timestamp(),
        };
        let token = claims.create_token(&state.config.auth.jwt_secret).unwrap();
        let router = create_router(state);

        for uri in [
            "/api/v1/books?page=abc",
            "/api/v1/libraries?per_page=ten",
            "/api/v1/books?page=9223372036854775807",
        ] {
            let response = router
                .clone()
                .oneshot(
                    Request::get(uri)
                        .header(AUTHORIZATION, format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = json_body(response).await;
            assert_eq!(body["error"], "BadValue", "{}", uri);
            assert_eq!(body["code"], 7);
        }
    }
}
