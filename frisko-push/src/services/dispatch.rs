use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use frisko_shared::clients::db::DbPool;
use frisko_shared::clients::fcm::{token_prefix, FcmClient};
use frisko_shared::errors::{AppError, AppResult};

use crate::models::{NewQueuedNotification, QueuedNotification};
use crate::schema::{fcm_tokens, notification_queue};

/// FCM rejects multicasts above 500 recipients; the original function
/// silently sliced the list, and so do we.
pub const MAX_BATCH_TOKENS: usize = 500;

pub fn batch_limit(tokens: &[String]) -> &[String] {
    &tokens[..tokens.len().min(MAX_BATCH_TOKENS)]
}

const DISPATCH_BATCH_SIZE: i64 = 100;

/// Queue a push notification row for later dispatch.
pub fn enqueue_notification(
    pool: &DbPool,
    user_id: Uuid,
    notification_type: &str,
    title: &str,
    body: &str,
    data: Option<serde_json::Value>,
) -> AppResult<QueuedNotification> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let new_notification = NewQueuedNotification {
        user_id,
        notification_type: notification_type.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        data,
    };

    let notification = diesel::insert_into(notification_queue::table)
        .values(&new_notification)
        .get_result::<QueuedNotification>(&mut conn)?;

    tracing::debug!(
        notification_id = %notification.id,
        user_id = %user_id,
        notification_type = %notification_type,
        "push notification queued"
    );

    Ok(notification)
}

#[derive(Debug, Serialize)]
pub struct DispatchResult {
    pub notification_id: Uuid,
    pub status: &'static str,
    pub devices: usize,
    pub failures: usize,
}

/// Drain the unsent queue: for each row, send to every device token the
/// user has registered and mark the row sent. Rows for users without
/// tokens are marked sent as well so they are not retried forever.
pub async fn dispatch_pending(pool: &DbPool, fcm: &FcmClient) -> AppResult<Vec<DispatchResult>> {
    let pending: Vec<QueuedNotification> = {
        let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
        notification_queue::table
            .filter(notification_queue::sent.eq(false))
            .order(notification_queue::created_at.asc())
            .limit(DISPATCH_BATCH_SIZE)
            .load::<QueuedNotification>(&mut conn)?
    };

    if pending.is_empty() {
        return Ok(vec![]);
    }

    let mut results = Vec::with_capacity(pending.len());

    for notification in &pending {
        let tokens: Vec<String> = {
            let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
            fcm_tokens::table
                .filter(fcm_tokens::user_id.eq(notification.user_id))
                .select(fcm_tokens::token)
                .load::<String>(&mut conn)?
        };

        if tokens.is_empty() {
            mark_sent(pool, notification.id)?;
            results.push(DispatchResult {
                notification_id: notification.id,
                status: "no_tokens",
                devices: 0,
                failures: 0,
            });
            continue;
        }

        let mut failures = 0usize;
        for token in &tokens {
            if let Err(e) = fcm
                .send(
                    token,
                    &notification.title,
                    &notification.body,
                    notification.data.clone(),
                )
                .await
            {
                tracing::error!(
                    notification_id = %notification.id,
                    token_prefix = %token_prefix(token),
                    error = %e,
                    "push send failed"
                );
                failures += 1;
            }
        }

        mark_sent(pool, notification.id)?;
        results.push(DispatchResult {
            notification_id: notification.id,
            status: "sent",
            devices: tokens.len(),
            failures,
        });
    }

    Ok(results)
}

fn mark_sent(pool: &DbPool, notification_id: Uuid) -> AppResult<()> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;
    diesel::update(notification_queue::table.find(notification_id))
        .set(notification_queue::sent.eq(true))
        .execute(&mut conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_limit_caps_at_500() {
        let tokens: Vec<String> = (0..600).map(|i| format!("token-{i}")).collect();
        assert_eq!(batch_limit(&tokens).len(), MAX_BATCH_TOKENS);
        assert_eq!(batch_limit(&tokens)[0], "token-0");
        assert_eq!(batch_limit(&tokens)[499], "token-499");
    }

    #[test]
    fn batch_limit_keeps_small_lists() {
        let tokens: Vec<String> = (0..3).map(|i| format!("token-{i}")).collect();
        assert_eq!(batch_limit(&tokens).len(), 3);
        assert!(batch_limit(&[]).is_empty());
    }
}
