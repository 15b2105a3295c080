use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use frisko_shared::types::api::HealthResponse;

use crate::AppState;

pub async fn health_check(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        "frisko-api",
        env!("CARGO_PKG_VERSION"),
    ))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
