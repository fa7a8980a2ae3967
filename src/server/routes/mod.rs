use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::server::AppState;
use crate::server::response::ApiResponse;

pub mod projects;
pub mod sources;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(projects::router())
        .merge(sources::router())
}

async fn health() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
