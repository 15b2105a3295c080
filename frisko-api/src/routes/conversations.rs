use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use frisko_shared::errors::{AppError, AppResult};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::models::{Message, Profile};
use crate::schema::{messages, profiles};
use crate::services::conversation_service;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub partner_id: Uuid,
    pub partner_name: Option<String>,
    pub partner_avatar: Option<String>,
    pub partner_verified: bool,
    pub last_message: Message,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i64,
}

/// GET /conversations - one thread per counterparty with preview and unread
/// count. One query for the messages, one pass to aggregate, one batched
/// query for the partner profiles.
pub async fn list_conversations(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConversationPreview>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let my_messages: Vec<Message> = messages::table
        .filter(
            messages::sender_id
                .eq(user.id)
                .or(messages::receiver_id.eq(user.id)),
        )
        .order(messages::created_at.desc())
        .load::<Message>(&mut conn)
        .map_err(AppError::Database)?;

    let threads = conversation_service::aggregate_conversations(user.id, &my_messages);

    if threads.is_empty() {
        return Ok(Json(ApiResponse::ok(vec![])));
    }

    // Batch-load the partner profiles
    let partner_ids: Vec<Uuid> = threads.iter().map(|t| t.partner_id).collect();
    let partners: Vec<Profile> = profiles::table
        .filter(profiles::id.eq_any(&partner_ids))
        .load::<Profile>(&mut conn)
        .map_err(AppError::Database)?;
    let partner_map: HashMap<Uuid, Profile> =
        partners.into_iter().map(|p| (p.id, p)).collect();

    let previews = threads
        .into_iter()
        .map(|thread| {
            let partner = partner_map.get(&thread.partner_id);
            ConversationPreview {
                partner_id: thread.partner_id,
                partner_name: partner.map(|p| p.display_name.clone()),
                partner_avatar: partner.and_then(|p| p.avatar_url.clone()),
                partner_verified: partner.map(|p| p.verified).unwrap_or(false),
                last_message_time: thread.last_message.created_at,
                last_message: thread.last_message,
                unread_count: thread.unread_count,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(previews)))
}
