use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use frisko_shared::errors::{AppError, AppResult};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::models::{Message, Product, Profile, Reservation};
use crate::schema::{messages, products, profiles, reservations};
use crate::services::notification_feed::{
    build_feed, FeedNotification, MessageFeedRow, ReservationFeedRow,
};
use crate::services::reservation_service::ReservationStatus;
use crate::AppState;

const SELLER_FEED_LIMIT: i64 = 20;
const MESSAGE_FEED_LIMIT: i64 = 20;
const BUYER_FEED_LIMIT: i64 = 10;

/// GET /notifications - the derived notification feed.
///
/// Three reads against the same database; if any of them fails the whole
/// request fails rather than returning a partial feed.
pub async fn list_notifications(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<FeedNotification>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    // (a) reservations on the user's products, with the buyer's name
    let seller_rows: Vec<(Reservation, Product, Profile)> = reservations::table
        .inner_join(products::table)
        .inner_join(profiles::table.on(profiles::id.eq(reservations::buyer_id)))
        .filter(reservations::seller_id.eq(user.id))
        .order(reservations::created_at.desc())
        .limit(SELLER_FEED_LIMIT)
        .load::<(Reservation, Product, Profile)>(&mut conn)
        .map_err(AppError::Database)?;

    // (b) unread messages to the user, with the sender's name
    let message_rows: Vec<(Message, Profile)> = messages::table
        .inner_join(profiles::table.on(profiles::id.eq(messages::sender_id)))
        .filter(messages::receiver_id.eq(user.id))
        .filter(messages::read.eq(false))
        .order(messages::created_at.desc())
        .limit(MESSAGE_FEED_LIMIT)
        .load::<(Message, Profile)>(&mut conn)
        .map_err(AppError::Database)?;

    // (c) status changes on the user's own reservations, with the seller's name
    let buyer_rows: Vec<(Reservation, Product, Profile)> = reservations::table
        .inner_join(products::table)
        .inner_join(profiles::table.on(profiles::id.eq(reservations::seller_id)))
        .filter(reservations::buyer_id.eq(user.id))
        .filter(reservations::status.ne(ReservationStatus::Pending.as_str()))
        .order(reservations::updated_at.desc())
        .limit(BUYER_FEED_LIMIT)
        .load::<(Reservation, Product, Profile)>(&mut conn)
        .map_err(AppError::Database)?;

    let seller_feed: Vec<ReservationFeedRow> = seller_rows
        .into_iter()
        .map(|(reservation, product, buyer)| ReservationFeedRow {
            reservation,
            counterparty_name: buyer.display_name,
            product_title: product.title,
        })
        .collect();

    let message_feed: Vec<MessageFeedRow> = message_rows
        .into_iter()
        .map(|(message, sender)| MessageFeedRow {
            message,
            sender_name: sender.display_name,
        })
        .collect();

    let buyer_feed: Vec<ReservationFeedRow> = buyer_rows
        .into_iter()
        .map(|(reservation, product, seller)| ReservationFeedRow {
            reservation,
            counterparty_name: seller.display_name,
            product_title: product.title,
        })
        .collect();

    let feed = build_feed(&seller_feed, &message_feed, &buyer_feed);

    Ok(Json(ApiResponse::ok(feed)))
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /notifications/mark-all-read - flip all unread messages to read
pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let updated = diesel::update(
        messages::table
            .filter(messages::receiver_id.eq(user.id))
            .filter(messages::read.eq(false)),
    )
    .set(messages::read.eq(true))
    .execute(&mut conn)
    .map_err(AppError::Database)?;

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}
