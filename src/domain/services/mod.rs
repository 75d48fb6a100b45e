pub mod admin_config;
pub mod auth_service;
pub mod availability;
pub mod notification_service;
pub mod subscription_service;
