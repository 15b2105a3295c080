use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{favorites, messages, products, profiles, reservations};

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub role: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub bio: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub location_address: Option<String>,
    pub rating: f64,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_seller(&self) -> bool {
        matches!(self.role.as_str(), "seller" | "farmer" | "admin")
    }
}

// --- Product ---

pub mod stock_status {
    pub const AVAILABLE: &str = "available";
    pub const LOW: &str = "low";
    pub const OUT: &str = "out";
}

pub const CATEGORIES: &[&str] = &["voce", "povrce", "meso", "jaja", "mlijecni", "ostalo"];

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = products)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub unit: String,
    pub category: String,
    pub image_url: Option<String>,
    pub stock_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub unit: String,
    pub category: String,
    pub image_url: Option<String>,
    pub stock_status: String,
}

// --- Favorite ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = favorites)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub seller_id: Uuid,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub product_id: Option<Uuid>,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub product_id: Option<Uuid>,
    pub content: String,
    pub read: bool,
}

// --- Reservation ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reservations)]
pub struct Reservation {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub status: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reservations)]
pub struct NewReservation {
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub status: String,
    pub message: Option<String>,
}
