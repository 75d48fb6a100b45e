use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const KIND_BOOKING_CONFIRMED: &str = "booking_confirmed";
pub const KIND_BOOKING_CANCELLED: &str = "booking_cancelled";
pub const KIND_BOOKING_RESCHEDULED: &str = "booking_rescheduled";
pub const KIND_BOOKING_REMINDER: &str = "booking_reminder";
pub const KIND_SUBSCRIPTION_UNDER_REVIEW: &str = "subscription_under_review";
pub const KIND_SUBSCRIPTION_APPROVED: &str = "subscription_approved";
pub const KIND_SUBSCRIPTION_REJECTED: &str = "subscription_rejected";
pub const KIND_SUBSCRIPTION_EXPIRED: &str = "subscription_expired";
pub const KIND_LOW_STOCK: &str = "low_stock";
pub const KIND_ANNOUNCEMENT: &str = "announcement";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(user_id: &str, kind: &str, title: String, message: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            title,
            message,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
