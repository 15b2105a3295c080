pub mod conversations;
pub mod favorites;
pub mod health;
pub mod messages;
pub mod notifications;
pub mod products;
pub mod profiles;
pub mod reservations;
