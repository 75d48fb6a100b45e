use crate::domain::models::{
    user::User, auth::RefreshTokenRecord, booking::{Booking, BookingFilter},
    subscription::SubscriptionRequest, admin_config::AdminConfigRecord,
    notification::Notification, inventory::InventoryItem, pos::PosSale,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn list_active_by_role(&self, role: &str) -> Result<Vec<User>, AppError>;
    async fn update(&self, user: &User) -> Result<User, AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
    async fn delete_for_user(&self, user_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking only while fewer than `capacity` active bookings hold its slot.
    /// `None` means the slot filled up first.
    async fn create_within_capacity(&self, booking: &Booking, capacity: i32) -> Result<Option<Booking>, AppError>;
    /// Moves a confirmed booking to the date/slot it carries, under the same capacity rule.
    async fn reschedule_within_capacity(&self, booking: &Booking, capacity: i32) -> Result<Option<Booking>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError>;
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError>;
    async fn list_active_for_day(&self, date: NaiveDate, branch_id: &str) -> Result<Vec<Booking>, AppError>;
    /// Moves the booking from `from` to `to`. `None` when it no longer has status `from`.
    async fn update_status_if(&self, id: &str, from: &str, to: &str) -> Result<Option<Booking>, AppError>;
    async fn list_reminder_candidates(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError>;
    async fn mark_reminder_sent(&self, id: &str) -> Result<(), AppError>;
    async fn count_by_status_for_date(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<(String, i64)>, AppError>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn create(&self, request: &SubscriptionRequest) -> Result<SubscriptionRequest, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<SubscriptionRequest>, AppError>;
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SubscriptionRequest>, AppError>;
    async fn list(&self, status: Option<&str>) -> Result<Vec<SubscriptionRequest>, AppError>;
    /// Persists a decision only if the stored status still equals `expected_status`.
    async fn update_if_status(&self, request: &SubscriptionRequest, expected_status: &str) -> Result<Option<SubscriptionRequest>, AppError>;
    async fn count_by_status(&self) -> Result<Vec<(String, i64)>, AppError>;
    async fn list_expired_approvals(&self, today: NaiveDate) -> Result<Vec<SubscriptionRequest>, AppError>;
}

#[async_trait]
pub trait AdminConfigRepository: Send + Sync {
    async fn get(&self) -> Result<Option<AdminConfigRecord>, AppError>;
    async fn upsert(&self, config_json: &str, updated_by: Option<&str>) -> Result<AdminConfigRecord, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;
    async fn create_many(&self, notifications: &[Notification]) -> Result<(), AppError>;
    async fn list_by_user(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>, AppError>;
    async fn mark_read(&self, user_id: &str, id: &str) -> Result<bool, AppError>;
    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn create(&self, item: &InventoryItem) -> Result<InventoryItem, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<InventoryItem>, AppError>;
    async fn list(&self, branch_id: Option<&str>, low_stock_only: bool) -> Result<Vec<InventoryItem>, AppError>;
    async fn update(&self, item: &InventoryItem) -> Result<InventoryItem, AppError>;
    /// Applies `delta` unless the quantity would drop below zero (`None`).
    async fn adjust_quantity(&self, id: &str, delta: i32) -> Result<Option<InventoryItem>, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
    async fn count_low_stock(&self) -> Result<i64, AppError>;
}

#[async_trait]
pub trait PosRepository: Send + Sync {
    async fn create(&self, sale: &PosSale) -> Result<PosSale, AppError>;
    /// Records the sale and flips its booking from confirmed to completed in one transaction.
    async fn create_for_booking(&self, sale: &PosSale, booking_id: &str) -> Result<PosSale, AppError>;
    async fn list(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<PosSale>, AppError>;
    /// (payment_method, sales count, total cents) for one business day.
    async fn totals_by_payment_method(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<(String, i64, i64)>, AppError>;
}
