use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use frisko_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Message, NewMessage, NewReservation, Reservation};
use crate::schema::{messages, reservations};
use crate::services::conversation_service::pair_conversation_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("unknown reservation status: {s}")),
        }
    }
}

/// Which side of the reservation the caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationRole {
    Buyer,
    Seller,
}

/// The full transition table. The seller drives the lifecycle
/// (accept, reject, fulfil); the buyer can only withdraw a pending request.
pub fn transition_allowed(
    role: ReservationRole,
    from: ReservationStatus,
    to: ReservationStatus,
) -> bool {
    use ReservationStatus::*;

    match (role, from, to) {
        (ReservationRole::Seller, Pending, Confirmed) => true,
        (ReservationRole::Seller, Pending, Cancelled) => true,
        (ReservationRole::Seller, Confirmed, Completed) => true,
        (ReservationRole::Buyer, Pending, Cancelled) => true,
        _ => false,
    }
}

/// The message sent to the seller when a reservation is created.
pub fn reservation_message_content(
    quantity: f64,
    unit: &str,
    product_title: &str,
    note: Option<&str>,
) -> String {
    let base = format!("Rezervacija: {quantity} {unit} - {product_title}");
    match note {
        Some(note) if !note.trim().is_empty() => format!("{base}\n\n{}", note.trim()),
        _ => base,
    }
}

/// Create a reservation and the paired message to the seller in one
/// transaction; either both rows exist afterwards or neither does.
pub fn create_reservation(
    conn: &mut PgConnection,
    buyer_id: Uuid,
    seller_id: Uuid,
    product_id: Uuid,
    product_title: &str,
    quantity: f64,
    unit: &str,
    note: Option<&str>,
) -> AppResult<(Reservation, Message)> {
    let content = reservation_message_content(quantity, unit, product_title, note);
    let note = note.map(|n| n.trim()).filter(|n| !n.is_empty());

    conn.transaction::<_, AppError, _>(|conn| {
        let reservation: Reservation = diesel::insert_into(reservations::table)
            .values(&NewReservation {
                buyer_id,
                seller_id,
                product_id,
                quantity,
                unit: unit.to_string(),
                status: ReservationStatus::Pending.as_str().to_string(),
                message: note.map(|n| n.to_string()),
            })
            .get_result(conn)
            .map_err(AppError::Database)?;

        let message: Message = diesel::insert_into(messages::table)
            .values(&NewMessage {
                conversation_id: pair_conversation_id(buyer_id, seller_id),
                sender_id: buyer_id,
                receiver_id: seller_id,
                product_id: Some(product_id),
                content,
                read: false,
            })
            .get_result(conn)
            .map_err(AppError::Database)?;

        Ok((reservation, message))
    })
}

/// Move a reservation to `new_status` on behalf of `actor_id`.
///
/// The UPDATE is guarded on the status the actor saw, so a concurrent
/// transition from another session loses nothing silently: the second
/// writer gets `ConcurrentUpdate` instead of clobbering the first.
pub fn transition_status(
    conn: &mut PgConnection,
    reservation_id: Uuid,
    actor_id: Uuid,
    new_status: ReservationStatus,
) -> AppResult<(Reservation, ReservationStatus)> {
    let current: Reservation = reservations::table
        .find(reservation_id)
        .first::<Reservation>(conn)
        .optional()
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::new(ErrorCode::ReservationNotFound, "reservation not found"))?;

    let role = if actor_id == current.seller_id {
        ReservationRole::Seller
    } else if actor_id == current.buyer_id {
        ReservationRole::Buyer
    } else {
        return Err(AppError::new(
            ErrorCode::NotReservationParty,
            "you are not a party to this reservation",
        ));
    };

    let from: ReservationStatus = current
        .status
        .parse()
        .map_err(|e: String| AppError::internal(e))?;

    if !transition_allowed(role, from, new_status) {
        return Err(AppError::new(
            ErrorCode::InvalidTransition,
            format!("cannot move reservation from {from} to {new_status}"),
        ));
    }

    // Compare-and-swap on the status the actor based their decision on
    let updated: Option<Reservation> = diesel::update(
        reservations::table
            .find(reservation_id)
            .filter(reservations::status.eq(from.as_str())),
    )
    .set((
        reservations::status.eq(new_status.as_str()),
        reservations::updated_at.eq(Utc::now()),
    ))
    .get_result(conn)
    .optional()
    .map_err(AppError::Database)?;

    match updated {
        Some(reservation) => Ok((reservation, from)),
        None => Err(AppError::new(
            ErrorCode::ConcurrentUpdate,
            "reservation was updated by another session, reload and retry",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationRole::{Buyer, Seller};
    use ReservationStatus::*;

    #[test]
    fn seller_lifecycle_transitions() {
        assert!(transition_allowed(Seller, Pending, Confirmed));
        assert!(transition_allowed(Seller, Pending, Cancelled));
        assert!(transition_allowed(Seller, Confirmed, Completed));
    }

    #[test]
    fn seller_cannot_cancel_confirmed() {
        assert!(!transition_allowed(Seller, Confirmed, Cancelled));
    }

    #[test]
    fn buyer_can_only_withdraw_pending() {
        assert!(transition_allowed(Buyer, Pending, Cancelled));

        assert!(!transition_allowed(Buyer, Pending, Confirmed));
        assert!(!transition_allowed(Buyer, Pending, Completed));
        assert!(!transition_allowed(Buyer, Confirmed, Cancelled));
        assert!(!transition_allowed(Buyer, Confirmed, Completed));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for role in [Buyer, Seller] {
            for from in [Cancelled, Completed] {
                for to in [Pending, Confirmed, Cancelled, Completed] {
                    assert!(
                        !transition_allowed(role, from, to),
                        "{role:?} {from} -> {to} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn pending_is_never_reentered() {
        for role in [Buyer, Seller] {
            for from in [Pending, Confirmed, Cancelled, Completed] {
                assert!(!transition_allowed(role, from, Pending));
            }
        }
    }

    #[test]
    fn no_self_transitions() {
        for role in [Buyer, Seller] {
            for status in [Pending, Confirmed, Cancelled, Completed] {
                assert!(!transition_allowed(role, status, status));
            }
        }
    }

    #[test]
    fn status_roundtrips_through_strings() {
        for status in [Pending, Confirmed, Cancelled, Completed] {
            assert_eq!(status.as_str().parse::<ReservationStatus>(), Ok(status));
        }
        assert!("unknown".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn terminal_flags() {
        assert!(!Pending.is_terminal());
        assert!(!Confirmed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Completed.is_terminal());
    }

    #[test]
    fn message_content_without_note() {
        let content = reservation_message_content(3.0, "kg", "Domaći krumpir", None);
        assert_eq!(content, "Rezervacija: 3 kg - Domaći krumpir");
    }

    #[test]
    fn message_content_with_note() {
        let content =
            reservation_message_content(2.5, "kg", "Svježa jaja", Some("Dolazim u subotu"));
        assert_eq!(content, "Rezervacija: 2.5 kg - Svježa jaja\n\nDolazim u subotu");
    }

    #[test]
    fn message_content_blank_note_is_dropped() {
        let content = reservation_message_content(1.0, "l", "Mlijeko", Some("   "));
        assert_eq!(content, "Rezervacija: 1 l - Mlijeko");
    }
}
