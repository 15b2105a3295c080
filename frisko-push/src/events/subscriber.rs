use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use frisko_shared::types::event::{payloads, routing_keys, Event};

use crate::services::dispatch;
use crate::AppState;

fn status_label(status: &str) -> &'static str {
    match status {
        "confirmed" => "potvrđena",
        "cancelled" => "otkazana",
        "completed" => "završena",
        _ => "ažurirana",
    }
}

/// Listen for reservation.created events and queue a push for the seller.
pub async fn listen_reservation_created(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "frisko-push.reservation.created",
        &[routing_keys::RESERVATION_CREATED],
    ).await?;

    tracing::info!("listening for reservation.created events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::ReservationCreated>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            reservation_id = %data.reservation_id,
                            seller_id = %data.seller_id,
                            "received reservation.created event"
                        );

                        if let Err(e) = dispatch::enqueue_notification(
                            &state.db,
                            data.seller_id,
                            "reservation",
                            "Nova rezervacija",
                            &format!(
                                "{} je rezervirao {} {} - {}",
                                data.buyer_display_name, data.quantity, data.unit, data.product_title
                            ),
                            Some(serde_json::json!({
                                "reservation_id": data.reservation_id,
                                "product_id": data.product_id,
                                "buyer_id": data.buyer_id,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to queue reservation notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize reservation.created event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "reservation.created consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for reservation.status_changed events and queue a push for the
/// counterparty of the actor (seller action notifies buyer and vice versa).
pub async fn listen_reservation_status_changed(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "frisko-push.reservation.status_changed",
        &[routing_keys::RESERVATION_STATUS_CHANGED],
    ).await?;

    tracing::info!("listening for reservation.status_changed events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::ReservationStatusChanged>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        let recipient_id = if data.actor_id == data.seller_id {
                            data.buyer_id
                        } else {
                            data.seller_id
                        };

                        tracing::info!(
                            reservation_id = %data.reservation_id,
                            recipient_id = %recipient_id,
                            new_status = %data.new_status,
                            "received reservation.status_changed event"
                        );

                        if let Err(e) = dispatch::enqueue_notification(
                            &state.db,
                            recipient_id,
                            "reservation_update",
                            &format!("Rezervacija {}", status_label(&data.new_status)),
                            &format!(
                                "Rezervacija za {} je {}",
                                data.product_title,
                                status_label(&data.new_status)
                            ),
                            Some(serde_json::json!({
                                "reservation_id": data.reservation_id,
                                "product_id": data.product_id,
                                "status": data.new_status,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to queue status_changed notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize reservation.status_changed event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "reservation.status_changed consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for message.sent events and queue a push for the receiver.
pub async fn listen_message_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "frisko-push.message.sent",
        &[routing_keys::MESSAGE_SENT],
    ).await?;

    tracing::info!("listening for message events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::MessageSent>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            message_id = %data.message_id,
                            receiver_id = %data.receiver_id,
                            "received message.sent event"
                        );

                        if let Err(e) = dispatch::enqueue_notification(
                            &state.db,
                            data.receiver_id,
                            "message",
                            "Nova poruka",
                            &format!("{}: {}", data.sender_display_name, data.content_preview),
                            Some(serde_json::json!({
                                "message_id": data.message_id,
                                "conversation_id": data.conversation_id,
                                "sender_id": data.sender_id,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to queue message notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize message.sent event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "message consumer error");
            }
        }
    }

    Ok(())
}
