pub mod db;
pub mod fcm;
pub mod rabbitmq;
pub mod redis;
