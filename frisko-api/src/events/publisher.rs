use uuid::Uuid;

use frisko_shared::clients::rabbitmq::RabbitMQClient;
use frisko_shared::types::event::{payloads, routing_keys, Event};

use crate::models::{Product, Reservation};

pub async fn publish_reservation_created(
    rabbitmq: &RabbitMQClient,
    reservation: &Reservation,
    product: &Product,
    buyer_display_name: &str,
) {
    let event = Event::new(
        "frisko-api",
        routing_keys::RESERVATION_CREATED,
        payloads::ReservationCreated {
            reservation_id: reservation.id,
            buyer_id: reservation.buyer_id,
            seller_id: reservation.seller_id,
            product_id: reservation.product_id,
            product_title: product.title.clone(),
            buyer_display_name: buyer_display_name.to_string(),
            quantity: reservation.quantity,
            unit: reservation.unit.clone(),
        },
    )
    .with_user(reservation.buyer_id);

    if let Err(e) = rabbitmq.publish(routing_keys::RESERVATION_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish reservation.created event");
    }
}

pub async fn publish_reservation_status_changed(
    rabbitmq: &RabbitMQClient,
    reservation: &Reservation,
    product_title: &str,
    old_status: &str,
    actor_id: Uuid,
) {
    let event = Event::new(
        "frisko-api",
        routing_keys::RESERVATION_STATUS_CHANGED,
        payloads::ReservationStatusChanged {
            reservation_id: reservation.id,
            buyer_id: reservation.buyer_id,
            seller_id: reservation.seller_id,
            product_id: reservation.product_id,
            product_title: product_title.to_string(),
            old_status: old_status.to_string(),
            new_status: reservation.status.clone(),
            actor_id,
        },
    )
    .with_user(actor_id);

    if let Err(e) = rabbitmq
        .publish(routing_keys::RESERVATION_STATUS_CHANGED, &event)
        .await
    {
        tracing::error!(error = %e, "failed to publish reservation.status_changed event");
    }
}

pub async fn publish_message_sent(
    rabbitmq: &RabbitMQClient,
    message_id: Uuid,
    conversation_id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    sender_display_name: &str,
    content_preview: &str,
) {
    let event = Event::new(
        "frisko-api",
        routing_keys::MESSAGE_SENT,
        payloads::MessageSent {
            message_id,
            conversation_id,
            sender_id,
            receiver_id,
            sender_display_name: sender_display_name.to_string(),
            content_preview: content_preview.to_string(),
        },
    )
    .with_user(sender_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MESSAGE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish message.sent event");
    }
}
