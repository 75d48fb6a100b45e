pub mod sqlite_user_repo;
pub mod sqlite_auth_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_subscription_repo;
pub mod sqlite_admin_config_repo;
pub mod sqlite_notification_repo;
pub mod sqlite_inventory_repo;
pub mod sqlite_pos_repo;

pub mod postgres_user_repo;
pub mod postgres_auth_repo;
pub mod postgres_booking_repo;
pub mod postgres_subscription_repo;
pub mod postgres_admin_config_repo;
pub mod postgres_notification_repo;
pub mod postgres_inventory_repo;
pub mod postgres_pos_repo;
