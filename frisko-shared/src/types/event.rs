use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `frisko.{service}.{entity}.{action}`
/// Example: `frisko.market.reservation.created`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Reservation events
    pub const RESERVATION_CREATED: &str = "frisko.market.reservation.created";
    pub const RESERVATION_STATUS_CHANGED: &str = "frisko.market.reservation.status_changed";

    // Messaging events
    pub const MESSAGE_SENT: &str = "frisko.market.message.sent";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReservationCreated {
        pub reservation_id: Uuid,
        pub buyer_id: Uuid,
        pub seller_id: Uuid,
        pub product_id: Uuid,
        pub product_title: String,
        pub buyer_display_name: String,
        pub quantity: f64,
        pub unit: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReservationStatusChanged {
        pub reservation_id: Uuid,
        pub buyer_id: Uuid,
        pub seller_id: Uuid,
        pub product_id: Uuid,
        pub product_title: String,
        pub old_status: String,
        pub new_status: String,
        /// The party who performed the transition; the counterparty gets notified.
        pub actor_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageSent {
        pub message_id: Uuid,
        pub conversation_id: Uuid,
        pub sender_id: Uuid,
        pub receiver_id: Uuid,
        pub sender_display_name: String,
        pub content_preview: String,
    }
}
