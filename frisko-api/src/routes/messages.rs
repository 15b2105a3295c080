use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::pagination::{Paginated, PaginationParams};
use frisko_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Message, NewMessage, Profile};
use crate::schema::{messages, profiles};
use crate::services::conversation_service::pair_conversation_id;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub receiver_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub product_id: Option<Uuid>,
}

/// POST /messages - send a direct message
pub async fn send_message(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    if req.content.trim().is_empty() {
        return Err(AppError::new(ErrorCode::EmptyMessage, "message must have content"));
    }
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if req.receiver_id == user.id {
        return Err(AppError::new(
            ErrorCode::CannotMessageSelf,
            "you cannot message yourself",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // Receiver must exist; the sender's name rides along on the event
    let receiver_exists: i64 = profiles::table
        .filter(profiles::id.eq(req.receiver_id))
        .select(count_star())
        .first::<i64>(&mut conn)
        .map_err(AppError::Database)?;
    if receiver_exists == 0 {
        return Err(AppError::new(ErrorCode::ProfileNotFound, "receiver not found"));
    }

    let sender: Profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let message: Message = diesel::insert_into(messages::table)
        .values(&NewMessage {
            conversation_id: pair_conversation_id(user.id, req.receiver_id),
            sender_id: user.id,
            receiver_id: req.receiver_id,
            product_id: req.product_id,
            content: req.content.trim().to_string(),
            read: false,
        })
        .get_result(&mut conn)
        .map_err(AppError::Database)?;

    let content_preview: String = message.content.chars().take(100).collect();

    publisher::publish_message_sent(
        &state.rabbitmq,
        message.id,
        message.conversation_id,
        message.sender_id,
        message.receiver_id,
        &sender.display_name,
        &content_preview,
    )
    .await;

    let room = format!("user:{}", message.receiver_id);
    let _ = state.io.to(room).emit(
        "new_message",
        &serde_json::json!({
            "conversation_id": message.conversation_id,
            "message": &message,
        }),
    );

    Ok(Json(ApiResponse::ok(message)))
}

/// GET /conversations/:partner_id/messages - the pair's thread, newest first
pub async fn list_thread(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Message>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let conversation_id = pair_conversation_id(user.id, partner_id);

    let total: i64 = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .select(count_star())
        .first::<i64>(&mut conn)
        .map_err(AppError::Database)?;

    let items: Vec<Message> = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .order((messages::created_at.desc(), messages::id.desc()))
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<Message>(&mut conn)
        .map_err(AppError::Database)?;

    let paginated = Paginated::new(items, total as u64, &params);

    Ok(Json(ApiResponse::ok(paginated)))
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: usize,
}

/// POST /conversations/:partner_id/read - mark the partner's messages as read.
/// The read flag only ever flips false -> true.
pub async fn mark_thread_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(
        messages::table
            .filter(messages::sender_id.eq(partner_id))
            .filter(messages::receiver_id.eq(user.id))
            .filter(messages::read.eq(false)),
    )
    .set(messages::read.eq(true))
    .execute(&mut conn)
    .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(MarkReadResponse { updated })))
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}

/// GET /unread-count - total unread messages across all conversations
pub async fn get_unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let total_unread: i64 = messages::table
        .filter(messages::receiver_id.eq(user.id))
        .filter(messages::read.eq(false))
        .select(count_star())
        .first::<i64>(&mut conn)
        .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread })))
}
