pub mod conversation_service;
pub mod notification_feed;
pub mod reservation_service;
