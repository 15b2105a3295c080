use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{fcm_tokens, notification_queue};

// --- FcmToken ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = fcm_tokens)]
pub struct FcmToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = fcm_tokens)]
pub struct NewFcmToken {
    pub user_id: Uuid,
    pub token: String,
    pub platform: String,
}

// --- QueuedNotification ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = notification_queue)]
pub struct QueuedNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notification_queue)]
pub struct NewQueuedNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}
