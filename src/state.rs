use std::sync::Arc;
use crate::domain::ports::{
    AdminConfigRepository, AuthRepository, BookingRepository, InventoryRepository,
    NotificationRepository, PosRepository, SubscriptionRepository, UserRepository,
};
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::notification_service::NotificationService;
use crate::domain::services::subscription_service::SubscriptionService;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub subscription_repo: Arc<dyn SubscriptionRepository>,
    pub config_repo: Arc<dyn AdminConfigRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub inventory_repo: Arc<dyn InventoryRepository>,
    pub pos_repo: Arc<dyn PosRepository>,
    pub auth_service: Arc<AuthService>,
    pub notifications: Arc<NotificationService>,
    pub subscriptions: Arc<SubscriptionService>,
}
