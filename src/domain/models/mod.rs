pub mod admin_config;
pub mod auth;
pub mod booking;
pub mod inventory;
pub mod notification;
pub mod pos;
pub mod subscription;
pub mod user;
