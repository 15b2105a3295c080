use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};
use frisko_shared::types::auth::AuthUser;
use frisko_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{stock_status, Message, Product, Profile, Reservation};
use crate::schema::{products, profiles, reservations};
use crate::services::reservation_service::{self, ReservationStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub product_id: Uuid,
    pub quantity: f64,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateReservationResponse {
    pub reservation: Reservation,
    pub message: Message,
}

/// POST /reservations - reserve a quantity of a product.
///
/// The reservation and the "Rezervacija: ..." message to the seller are
/// created in a single transaction.
pub async fn create_reservation(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReservationRequest>,
) -> AppResult<Json<ApiResponse<CreateReservationResponse>>> {
    if !req.quantity.is_finite() || req.quantity <= 0.0 {
        return Err(AppError::new(
            ErrorCode::InvalidQuantity,
            "quantity must be a positive number",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let product: Product = products::table
        .find(req.product_id)
        .first::<Product>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound, "product not found"))?;

    if product.stock_status == stock_status::OUT {
        return Err(AppError::new(
            ErrorCode::ProductOutOfStock,
            "product is sold out",
        ));
    }

    if product.seller_id == user.id {
        return Err(AppError::new(
            ErrorCode::CannotReserveOwnProduct,
            "you cannot reserve your own product",
        ));
    }

    let buyer: Profile = profiles::table
        .find(user.id)
        .first::<Profile>(&mut conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let (reservation, message) = reservation_service::create_reservation(
        &mut conn,
        user.id,
        product.seller_id,
        product.id,
        &product.title,
        req.quantity,
        &product.unit,
        req.message.as_deref(),
    )?;

    publisher::publish_reservation_created(
        &state.rabbitmq,
        &reservation,
        &product,
        &buyer.display_name,
    )
    .await;

    // Realtime nudges for the seller; the client refetches its aggregates
    let seller_room = format!("user:{}", reservation.seller_id);
    let _ = state.io.to(seller_room.clone()).emit(
        "reservation-created",
        &serde_json::json!({
            "reservation_id": reservation.id,
            "product_id": reservation.product_id,
            "buyer_id": reservation.buyer_id,
        }),
    );
    let _ = state.io.to(seller_room).emit(
        "new_message",
        &serde_json::json!({
            "conversation_id": message.conversation_id,
            "message": &message,
        }),
    );

    tracing::info!(
        reservation_id = %reservation.id,
        buyer_id = %user.id,
        seller_id = %reservation.seller_id,
        "reservation created"
    );

    Ok(Json(ApiResponse::ok(CreateReservationResponse {
        reservation,
        message,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReservationListParams {
    #[serde(default = "default_view")]
    pub view: String,
}

fn default_view() -> String {
    "outgoing".to_string()
}

#[derive(Debug, Serialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub product_title: String,
    pub counterparty_id: Uuid,
    pub counterparty_name: String,
    pub counterparty_avatar: Option<String>,
}

/// GET /reservations?view=incoming|outgoing
///
/// `incoming` lists reservations on the caller's products (seller view),
/// `outgoing` the caller's own requests (buyer view).
pub async fn list_reservations(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReservationListParams>,
) -> AppResult<Json<ApiResponse<Vec<ReservationDetail>>>> {
    let incoming = match params.view.as_str() {
        "incoming" => true,
        "outgoing" => false,
        other => {
            return Err(AppError::new(
                ErrorCode::BadRequest,
                format!("unknown view: {other}"),
            ));
        }
    };

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let rows: Vec<(Reservation, Product, Profile)> = if incoming {
        reservations::table
            .inner_join(products::table)
            .inner_join(profiles::table.on(profiles::id.eq(reservations::buyer_id)))
            .filter(reservations::seller_id.eq(user.id))
            .order(reservations::created_at.desc())
            .load::<(Reservation, Product, Profile)>(&mut conn)
            .map_err(AppError::Database)?
    } else {
        reservations::table
            .inner_join(products::table)
            .inner_join(profiles::table.on(profiles::id.eq(reservations::seller_id)))
            .filter(reservations::buyer_id.eq(user.id))
            .order(reservations::created_at.desc())
            .load::<(Reservation, Product, Profile)>(&mut conn)
            .map_err(AppError::Database)?
    };

    let items = rows
        .into_iter()
        .map(|(reservation, product, counterparty)| ReservationDetail {
            reservation,
            product_title: product.title,
            counterparty_id: counterparty.id,
            counterparty_name: counterparty.display_name,
            counterparty_avatar: counterparty.avatar_url,
        })
        .collect();

    Ok(Json(ApiResponse::ok(items)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /reservations/:id/status - move a reservation through its lifecycle
pub async fn update_status(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let new_status: ReservationStatus = req
        .status
        .parse()
        .map_err(|e: String| AppError::new(ErrorCode::ValidationError, e))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let (reservation, old_status) =
        reservation_service::transition_status(&mut conn, reservation_id, user.id, new_status)?;

    let product_title: String = products::table
        .find(reservation.product_id)
        .select(products::title)
        .first::<String>(&mut conn)
        .unwrap_or_default();

    publisher::publish_reservation_status_changed(
        &state.rabbitmq,
        &reservation,
        &product_title,
        old_status.as_str(),
        user.id,
    )
    .await;

    // Seller actions notify the buyer and vice versa
    let counterparty_id = if user.id == reservation.seller_id {
        reservation.buyer_id
    } else {
        reservation.seller_id
    };
    let room = format!("user:{counterparty_id}");
    let _ = state.io.to(room).emit(
        "reservation-updated",
        &serde_json::json!({
            "reservation_id": reservation.id,
            "status": reservation.status,
        }),
    );

    tracing::info!(
        reservation_id = %reservation.id,
        actor_id = %user.id,
        from = %old_status,
        to = %reservation.status,
        "reservation status changed"
    );

    Ok(Json(ApiResponse::ok(reservation)))
}
