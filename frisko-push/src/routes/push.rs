use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use frisko_shared::clients::fcm::token_prefix;
use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::services::dispatch::{self, batch_limit, DispatchResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub sent: bool,
}

/// POST /push/send - forward one message to the push provider.
/// A provider fault surfaces directly as HTTP 500; there is no retry.
pub async fn send(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> AppResult<Json<ApiResponse<SendResponse>>> {
    if req.token.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "token is required"));
    }

    state
        .fcm
        .send(&req.token, &req.title, &req.body, req.data)
        .await
        .map_err(|e| AppError::new(ErrorCode::PushProviderError, e))?;

    Ok(Json(ApiResponse::ok(SendResponse { sent: true })))
}

#[derive(Debug, Deserialize)]
pub struct SendBatchRequest {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct RecipientResult {
    pub token: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendBatchResponse {
    pub requested: usize,
    pub attempted: usize,
    pub successes: usize,
    pub failures: usize,
    pub results: Vec<RecipientResult>,
}

/// POST /push/send-batch - fan one message out to up to 500 device tokens,
/// reporting per-recipient success/failure. Excess tokens are truncated.
pub async fn send_batch(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendBatchRequest>,
) -> AppResult<Json<ApiResponse<SendBatchResponse>>> {
    if req.tokens.is_empty() {
        return Err(AppError::new(
            ErrorCode::NoRecipients,
            "tokens array must not be empty",
        ));
    }

    let attempted = batch_limit(&req.tokens);
    let mut results = Vec::with_capacity(attempted.len());
    let mut successes = 0usize;

    for token in attempted {
        match state
            .fcm
            .send(token, &req.title, &req.body, req.data.clone())
            .await
        {
            Ok(()) => {
                successes += 1;
                results.push(RecipientResult {
                    token: token_prefix(token),
                    status: "sent",
                    error: None,
                });
            }
            Err(e) => {
                results.push(RecipientResult {
                    token: token_prefix(token),
                    status: "error",
                    error: Some(e),
                });
            }
        }
    }

    let failures = results.len() - successes;

    Ok(Json(ApiResponse::ok(SendBatchResponse {
        requested: req.tokens.len(),
        attempted: results.len(),
        successes,
        failures,
        results,
    })))
}

#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub processed: usize,
    pub results: Vec<DispatchResult>,
}

/// POST /push/dispatch - drain the pending notification queue
pub async fn dispatch_queue(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DispatchResponse>>> {
    let results = dispatch::dispatch_pending(&state.db, &state.fcm).await?;

    Ok(Json(ApiResponse::ok(DispatchResponse {
        processed: results.len(),
        results,
    })))
}
