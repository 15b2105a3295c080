use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::models::{FcmToken, NewFcmToken};
use crate::schema::fcm_tokens;
use crate::AppState;

const PLATFORMS: &[&str] = &["android", "ios", "web"];

#[derive(Debug, Deserialize)]
pub struct RegisterTokenRequest {
    pub token: String,
    #[serde(default = "default_platform")]
    pub platform: String,
}

fn default_platform() -> String {
    "android".to_string()
}

/// POST /tokens - register a device token for the authenticated user.
/// Re-registering the same token returns the existing row.
pub async fn register_token(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterTokenRequest>,
) -> AppResult<Json<ApiResponse<FcmToken>>> {
    if req.token.trim().is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "token is required"));
    }
    if !PLATFORMS.contains(&req.platform.as_str()) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("unknown platform: {}", req.platform),
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = fcm_tokens::table
        .filter(fcm_tokens::user_id.eq(user.id))
        .filter(fcm_tokens::token.eq(&req.token))
        .first::<FcmToken>(&mut conn)
        .optional()?;

    if let Some(existing) = existing {
        return Ok(Json(ApiResponse::ok(existing)));
    }

    let token: FcmToken = diesel::insert_into(fcm_tokens::table)
        .values(&NewFcmToken {
            user_id: user.id,
            token: req.token,
            platform: req.platform,
        })
        .get_result(&mut conn)?;

    tracing::debug!(user_id = %user.id, platform = %token.platform, "device token registered");

    Ok(Json(ApiResponse::ok(token)))
}

/// DELETE /tokens/:token - unregister a device token
pub async fn unregister_token(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        fcm_tokens::table
            .filter(fcm_tokens::user_id.eq(user.id))
            .filter(fcm_tokens::token.eq(&token)),
    )
    .execute(&mut conn)
    .map_err(AppError::Database)?;

    if deleted == 0 {
        return Err(AppError::new(
            ErrorCode::DeviceTokenNotFound,
            "device token not found",
        ));
    }

    Ok(Json(ApiResponse::ok(serde_json::json!({ "removed": true }))))
}
