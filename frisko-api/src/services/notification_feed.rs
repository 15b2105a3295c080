use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Message, Reservation};
use crate::services::reservation_service::ReservationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Reservation,
    ReservationUpdate,
    Message,
}

/// One entry of the derived notification feed. Nothing here is persisted;
/// the feed is recomputed in full on every read.
#[derive(Debug, Clone, Serialize)]
pub struct FeedNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

/// A reservation row joined with the counterparty's display name and the
/// product title, as loaded for the feed.
#[derive(Debug, Clone)]
pub struct ReservationFeedRow {
    pub reservation: Reservation,
    pub counterparty_name: String,
    pub product_title: String,
}

#[derive(Debug, Clone)]
pub struct MessageFeedRow {
    pub message: Message,
    pub sender_name: String,
}

fn status_label(status: &str) -> &'static str {
    match status.parse::<ReservationStatus>() {
        Ok(ReservationStatus::Confirmed) => "potvrđena",
        Ok(ReservationStatus::Cancelled) => "otkazana",
        Ok(ReservationStatus::Completed) => "završena",
        _ => "ažurirana",
    }
}

fn seller_entry(row: &ReservationFeedRow) -> FeedNotification {
    let res = &row.reservation;
    let pending = res.status == ReservationStatus::Pending.as_str();

    let title = if pending {
        "Nova rezervacija".to_string()
    } else {
        format!("Rezervacija {}", status_label(&res.status))
    };

    let verb = if pending { "rezervirao" } else { "ažurirao rezervaciju za" };
    let message = format!(
        "{} je {} {} {} - {}",
        row.counterparty_name, verb, res.quantity, res.unit, row.product_title
    );

    FeedNotification {
        id: format!("reservation-{}", res.id),
        notification_type: if pending {
            NotificationType::Reservation
        } else {
            NotificationType::ReservationUpdate
        },
        title,
        message,
        read: false,
        created_at: res.created_at,
        data: serde_json::json!({
            "reservation_id": res.id,
            "product_id": res.product_id,
            "status": res.status,
        }),
    }
}

fn buyer_entry(row: &ReservationFeedRow) -> FeedNotification {
    let res = &row.reservation;

    let verb = match res.status.parse::<ReservationStatus>() {
        Ok(ReservationStatus::Confirmed) => "potvrdio",
        Ok(ReservationStatus::Cancelled) => "otkazao",
        _ => "označio završenom",
    };
    let message = format!(
        "{} je {} vašu rezervaciju za {}",
        row.counterparty_name, verb, row.product_title
    );

    FeedNotification {
        id: format!("buyer-reservation-{}", res.id),
        notification_type: NotificationType::ReservationUpdate,
        title: format!("Rezervacija {}", status_label(&res.status)),
        message,
        read: false,
        // Status changes surface at the time of the change, not the booking
        created_at: res.updated_at,
        data: serde_json::json!({
            "reservation_id": res.id,
            "product_id": res.product_id,
            "status": res.status,
        }),
    }
}

fn message_entry(row: &MessageFeedRow) -> FeedNotification {
    let msg = &row.message;
    let preview: String = msg.content.chars().take(50).collect();
    let preview = if msg.content.chars().count() > 50 {
        format!("{preview}...")
    } else {
        preview
    };

    FeedNotification {
        id: format!("message-{}", msg.id),
        notification_type: NotificationType::Message,
        title: "Nova poruka".to_string(),
        message: format!("{}: {}", row.sender_name, preview),
        read: msg.read,
        created_at: msg.created_at,
        data: serde_json::json!({
            "message_id": msg.id,
            "sender_id": msg.sender_id,
        }),
    }
}

/// Merge the three feed sources into one list, newest first.
///
/// Stateless and idempotent: the same rows always produce the same ordered
/// list (entry id breaks timestamp ties). A single underlying record lands
/// in exactly one category per call.
pub fn build_feed(
    seller_reservations: &[ReservationFeedRow],
    unread_messages: &[MessageFeedRow],
    buyer_reservations: &[ReservationFeedRow],
) -> Vec<FeedNotification> {
    let mut feed: Vec<FeedNotification> = seller_reservations
        .iter()
        .map(seller_entry)
        .chain(unread_messages.iter().map(message_entry))
        .chain(buyer_reservations.iter().map(buyer_entry))
        .collect();

    feed.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn reservation_row(
        id: u128,
        status: &str,
        created: i64,
        updated: i64,
        name: &str,
        product: &str,
    ) -> ReservationFeedRow {
        ReservationFeedRow {
            reservation: Reservation {
                id: Uuid::from_u128(id),
                buyer_id: Uuid::from_u128(1),
                seller_id: Uuid::from_u128(2),
                product_id: Uuid::from_u128(3),
                quantity: 3.0,
                unit: "kg".to_string(),
                status: status.to_string(),
                message: None,
                created_at: at(created),
                updated_at: at(updated),
            },
            counterparty_name: name.to_string(),
            product_title: product.to_string(),
        }
    }

    fn message_row(id: u128, content: &str, created: i64, sender: &str) -> MessageFeedRow {
        MessageFeedRow {
            message: Message {
                id: Uuid::from_u128(id),
                conversation_id: Uuid::from_u128(99),
                sender_id: Uuid::from_u128(1),
                receiver_id: Uuid::from_u128(2),
                product_id: None,
                content: content.to_string(),
                read: false,
                created_at: at(created),
            },
            sender_name: sender.to_string(),
        }
    }

    #[test]
    fn feed_is_idempotent() {
        let sellers = vec![reservation_row(1, "pending", 10, 10, "Ana", "Krumpir")];
        let messages = vec![message_row(2, "Pozdrav", 20, "Marko")];
        let buyers = vec![reservation_row(3, "confirmed", 5, 30, "OPG Horvat", "Jaja")];

        let first = build_feed(&sellers, &messages, &buyers);
        let second = build_feed(&sellers, &messages, &buyers);

        let ids1: Vec<&str> = first.iter().map(|n| n.id.as_str()).collect();
        let ids2: Vec<&str> = second.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids1, ids2);
    }

    #[test]
    fn feed_sorted_newest_first_with_updated_at_for_buyer_rows() {
        let sellers = vec![reservation_row(1, "pending", 10, 10, "Ana", "Krumpir")];
        let messages = vec![message_row(2, "Pozdrav", 20, "Marko")];
        // created long ago, confirmed just now: must sort by updated_at
        let buyers = vec![reservation_row(3, "confirmed", 1, 30, "OPG Horvat", "Jaja")];

        let feed = build_feed(&sellers, &messages, &buyers);
        let ids: Vec<&str> = feed.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                format!("buyer-reservation-{}", Uuid::from_u128(3)).as_str(),
                format!("message-{}", Uuid::from_u128(2)).as_str(),
                format!("reservation-{}", Uuid::from_u128(1)).as_str(),
            ]
        );
    }

    #[test]
    fn each_record_lands_in_one_category() {
        let sellers = vec![
            reservation_row(1, "pending", 10, 10, "Ana", "Krumpir"),
            reservation_row(2, "confirmed", 10, 20, "Ana", "Krumpir"),
        ];
        let feed = build_feed(&sellers, &[], &[]);

        assert_eq!(feed.len(), 2);
        let pending = feed.iter().find(|n| n.id.ends_with(&Uuid::from_u128(1).to_string())).unwrap();
        let confirmed = feed.iter().find(|n| n.id.ends_with(&Uuid::from_u128(2).to_string())).unwrap();
        assert_eq!(pending.notification_type, NotificationType::Reservation);
        assert_eq!(confirmed.notification_type, NotificationType::ReservationUpdate);
    }

    #[test]
    fn seller_entry_wording() {
        let feed = build_feed(
            &[reservation_row(1, "pending", 0, 0, "Ana", "Domaći krumpir")],
            &[],
            &[],
        );
        assert_eq!(feed[0].title, "Nova rezervacija");
        assert_eq!(feed[0].message, "Ana je rezervirao 3 kg - Domaći krumpir");
        assert!(!feed[0].read);
    }

    #[test]
    fn buyer_entry_wording_per_status() {
        let confirmed = build_feed(&[], &[], &[reservation_row(1, "confirmed", 0, 0, "OPG Horvat", "Jaja")]);
        assert_eq!(confirmed[0].title, "Rezervacija potvrđena");
        assert_eq!(confirmed[0].message, "OPG Horvat je potvrdio vašu rezervaciju za Jaja");

        let cancelled = build_feed(&[], &[], &[reservation_row(2, "cancelled", 0, 0, "OPG Horvat", "Jaja")]);
        assert_eq!(cancelled[0].title, "Rezervacija otkazana");

        let completed = build_feed(&[], &[], &[reservation_row(3, "completed", 0, 0, "OPG Horvat", "Jaja")]);
        assert_eq!(completed[0].title, "Rezervacija završena");
        assert_eq!(completed[0].message, "OPG Horvat je označio završenom vašu rezervaciju za Jaja");
    }

    #[test]
    fn long_message_previews_are_truncated() {
        let long = "a".repeat(80);
        let feed = build_feed(&[], &[message_row(1, &long, 0, "Marko")], &[]);
        assert_eq!(feed[0].message, format!("Marko: {}...", "a".repeat(50)));
    }

    #[test]
    fn timestamp_ties_order_deterministically() {
        let sellers = vec![
            reservation_row(1, "pending", 10, 10, "Ana", "Krumpir"),
            reservation_row(2, "pending", 10, 10, "Iva", "Jabuke"),
        ];
        let a = build_feed(&sellers, &[], &[]);
        let reversed: Vec<ReservationFeedRow> = sellers.iter().rev().cloned().collect();
        let b = build_feed(&reversed, &[], &[]);

        let ids_a: Vec<&str> = a.iter().map(|n| n.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
