//! Front-end configuration endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

/// Settings the web client needs at startup
#[derive(Serialize, ToSchema)]
pub struct FrontendConfigResponse {
    pub site_title: String,
    /// Analytics tracking identifier, absent when tracking is disabled
    pub analytics_id: Option<String>,
    pub version: String,
}

/// Get front-end configuration
#[utoipa::path(
    get,
    path = "/config",
    tag = "frontend",
    responses(
        (status = 200, description = "Front-end configuration", body = FrontendConfigResponse)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> Json<FrontendConfigResponse> {
    let frontend = &state.config.frontend;
    Json(FrontendConfigResponse {
        site_title: frontend.site_title.clone(),
        analytics_id: frontend.analytics_id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
