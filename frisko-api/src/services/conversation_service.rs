use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::Message;

/// Stable conversation key for a pair of users.
///
/// UUIDv5 over the sorted pair, so the key is independent of who messaged
/// first and distinct pairs cannot collide the way a bare
/// "smaller of the two ids" key could.
pub fn pair_conversation_id(a: Uuid, b: Uuid) -> Uuid {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 32];
    buf[..16].copy_from_slice(lo.as_bytes());
    buf[16..].copy_from_slice(hi.as_bytes());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &buf)
}

#[derive(Debug, Serialize, Clone)]
pub struct ConversationThread {
    pub partner_id: Uuid,
    pub last_message: Message,
    pub unread_count: i64,
}

/// Collapse a user's flat message list into one thread per counterparty.
///
/// `messages` is every message where the user is sender or receiver, in any
/// order; one query, no per-partner round trips. The preview is the pair's
/// newest message (message id breaks created_at ties so the ordering is
/// deterministic), unread_count is the number of partner->user messages
/// still marked unread.
pub fn aggregate_conversations(user_id: Uuid, messages: &[Message]) -> Vec<ConversationThread> {
    let mut threads: HashMap<Uuid, (Message, i64)> = HashMap::new();

    for message in messages {
        let partner_id = if message.sender_id == user_id {
            message.receiver_id
        } else {
            message.sender_id
        };
        if partner_id == user_id {
            continue;
        }

        let unread = i64::from(message.receiver_id == user_id && !message.read);

        match threads.get_mut(&partner_id) {
            Some((preview, count)) => {
                if sort_key(message) > sort_key(preview) {
                    *preview = message.clone();
                }
                *count += unread;
            }
            None => {
                threads.insert(partner_id, (message.clone(), unread));
            }
        }
    }

    let mut result: Vec<ConversationThread> = threads
        .into_iter()
        .map(|(partner_id, (last_message, unread_count))| ConversationThread {
            partner_id,
            last_message,
            unread_count,
        })
        .collect();

    result.sort_by(|a, b| sort_key(&b.last_message).cmp(&sort_key(&a.last_message)));
    result
}

fn sort_key(message: &Message) -> (DateTime<Utc>, Uuid) {
    (message.created_at, message.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(
        id: u128,
        sender: Uuid,
        receiver: Uuid,
        read: bool,
        at_secs: i64,
    ) -> Message {
        Message {
            id: Uuid::from_u128(id),
            conversation_id: pair_conversation_id(sender, receiver),
            sender_id: sender,
            receiver_id: receiver,
            product_id: None,
            content: format!("message {id}"),
            read,
            created_at: Utc.timestamp_opt(1_700_000_000 + at_secs, 0).unwrap(),
        }
    }

    #[test]
    fn pair_key_is_order_independent() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_eq!(pair_conversation_id(a, b), pair_conversation_id(b, a));
    }

    #[test]
    fn pair_key_distinct_pairs_differ() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let c = Uuid::from_u128(3);
        assert_ne!(pair_conversation_id(a, b), pair_conversation_id(a, c));
        assert_ne!(pair_conversation_id(a, b), pair_conversation_id(b, c));
    }

    #[test]
    fn one_thread_per_counterparty() {
        let me = Uuid::from_u128(100);
        let ana = Uuid::from_u128(101);
        let marko = Uuid::from_u128(102);

        let messages = vec![
            msg(1, me, ana, true, 10),
            msg(2, ana, me, true, 20),
            msg(3, me, marko, true, 30),
            msg(4, marko, me, false, 40),
            msg(5, me, ana, true, 50),
        ];

        let threads = aggregate_conversations(me, &messages);
        assert_eq!(threads.len(), 2);
    }

    // A sends 3 messages to B, B replies once (unread by A):
    // A sees one thread with the reply as preview and unread_count = 1,
    // B sees one thread with unread_count = 0 before reading.
    #[test]
    fn reply_scenario_unread_semantics() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        let mut messages = vec![
            msg(1, a, b, false, 10),
            msg(2, a, b, false, 20),
            msg(3, a, b, false, 30),
            msg(4, b, a, false, 40),
        ];

        let a_threads = aggregate_conversations(a, &messages);
        assert_eq!(a_threads.len(), 1);
        assert_eq!(a_threads[0].partner_id, b);
        assert_eq!(a_threads[0].last_message.id, Uuid::from_u128(4));
        assert_eq!(a_threads[0].unread_count, 1);

        let b_threads = aggregate_conversations(b, &messages);
        assert_eq!(b_threads.len(), 1);
        assert_eq!(b_threads[0].partner_id, a);
        assert_eq!(b_threads[0].unread_count, 3);

        // B reads the incoming messages; own sent message stays irrelevant
        for m in &mut messages {
            if m.receiver_id == b {
                m.read = true;
            }
        }
        let b_threads = aggregate_conversations(b, &messages);
        assert_eq!(b_threads[0].unread_count, 0);
    }

    #[test]
    fn threads_sorted_by_newest_preview() {
        let me = Uuid::from_u128(100);
        let ana = Uuid::from_u128(101);
        let marko = Uuid::from_u128(102);

        let messages = vec![
            msg(1, ana, me, true, 10),
            msg(2, marko, me, true, 99),
        ];

        let threads = aggregate_conversations(me, &messages);
        assert_eq!(threads[0].partner_id, marko);
        assert_eq!(threads[1].partner_id, ana);
    }

    #[test]
    fn created_at_ties_break_on_message_id() {
        let me = Uuid::from_u128(100);
        let ana = Uuid::from_u128(101);
        let marko = Uuid::from_u128(102);

        // Same timestamp everywhere; the higher message id wins
        let messages = vec![
            msg(1, ana, me, true, 0),
            msg(2, marko, me, true, 0),
            msg(3, ana, me, true, 0),
        ];

        let threads = aggregate_conversations(me, &messages);
        assert_eq!(threads[0].partner_id, ana);
        assert_eq!(threads[0].last_message.id, Uuid::from_u128(3));
        assert_eq!(threads[1].partner_id, marko);

        // Input order must not matter
        let mut reversed = messages.clone();
        reversed.reverse();
        let threads2 = aggregate_conversations(me, &reversed);
        assert_eq!(threads2[0].partner_id, ana);
        assert_eq!(threads2[0].last_message.id, Uuid::from_u128(3));
    }

    #[test]
    fn empty_input_yields_no_threads() {
        let me = Uuid::from_u128(100);
        assert!(aggregate_conversations(me, &[]).is_empty());
    }
}
