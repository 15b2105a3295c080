use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::models::{Favorite, NewFavorite, Profile};
use crate::schema::{favorites, profiles};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub seller_id: Uuid,
}

/// POST /favorites - favorite a seller (idempotent)
pub async fn add_favorite(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddFavoriteRequest>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    if req.seller_id == user.id {
        return Err(AppError::new(
            ErrorCode::CannotFavoriteSelf,
            "you cannot favorite yourself",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Target must exist and be a seller profile
    let seller: Profile = profiles::table
        .find(req.seller_id)
        .first::<Profile>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "seller not found"))?;

    if !seller.is_seller() {
        return Err(AppError::new(
            ErrorCode::NotASeller,
            "favorites can only target seller profiles",
        ));
    }

    // One favorite per (user, seller) pair, lifetime
    let existing = favorites::table
        .filter(favorites::user_id.eq(user.id))
        .filter(favorites::seller_id.eq(req.seller_id))
        .first::<Favorite>(&mut conn)
        .optional()?;

    if let Some(existing) = existing {
        return Ok(Json(ApiResponse::ok(existing)));
    }

    let favorite: Favorite = diesel::insert_into(favorites::table)
        .values(&NewFavorite {
            user_id: user.id,
            seller_id: req.seller_id,
        })
        .get_result(&mut conn)?;

    Ok(Json(ApiResponse::ok(favorite)))
}

/// DELETE /favorites/:seller_id
pub async fn remove_favorite(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(seller_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        favorites::table
            .filter(favorites::user_id.eq(user.id))
            .filter(favorites::seller_id.eq(seller_id)),
    )
    .execute(&mut conn)
    .map_err(AppError::Database)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::FavoriteNotFound, "favorite not found"));
    }

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "removed": seller_id
    }))))
}

#[derive(Debug, Serialize)]
pub struct FavoriteSeller {
    pub favorite_id: Uuid,
    pub favorited_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub seller: Profile,
}

/// GET /favorites - the user's favorited sellers, newest first
pub async fn list_favorites(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<FavoriteSeller>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(Favorite, Profile)> = favorites::table
        .inner_join(profiles::table.on(profiles::id.eq(favorites::seller_id)))
        .filter(favorites::user_id.eq(user.id))
        .order(favorites::created_at.desc())
        .load::<(Favorite, Profile)>(&mut conn)
        .map_err(AppError::Database)?;

    let items = rows
        .into_iter()
        .map(|(favorite, seller)| FavoriteSeller {
            favorite_id: favorite.id,
            favorited_at: favorite.created_at,
            seller,
        })
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}
