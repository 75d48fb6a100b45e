use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
pub struct BlackoutDateRequest {
    pub date: NaiveDate,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub branch: Option<String>,
}

#[derive(Deserialize)]
pub struct SlotCheckQuery {
    pub date: NaiveDate,
    pub time_slot: String,
    pub branch: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub branch_id: Option<String>,
    pub date: NaiveDate,
    pub time_slot: String,
    pub service_type: String,
    pub vehicle_type: String,
    /// Staff only: the customer account the booking belongs to.
    pub user_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub time_slot: String,
}

#[derive(Deserialize)]
pub struct CreateSubscriptionRequest {
    pub package_type: String,
    pub branch_id: Option<String>,
    pub vehicle_plate: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct SubscriptionListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ApproveSubscriptionRequest {
    pub note: Option<String>,
}

#[derive(Deserialize)]
pub struct RejectSubscriptionRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread: bool,
}

#[derive(Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: Option<String>,
    pub title: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct InventoryListQuery {
    pub branch: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

#[derive(Deserialize)]
pub struct CreateInventoryItemRequest {
    pub branch_id: String,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub quantity: i32,
    pub unit: String,
    #[serde(default)]
    pub reorder_level: i32,
}

#[derive(Deserialize)]
pub struct UpdateInventoryItemRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub unit: Option<String>,
    pub reorder_level: Option<i32>,
}

#[derive(Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i32,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateSaleRequest {
    pub booking_id: Option<String>,
    pub branch_id: Option<String>,
    pub customer_id: Option<String>,
    pub service_type: Option<String>,
    pub vehicle_type: Option<String>,
    pub payment_method: String,
}

#[derive(Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
    pub branch: Option<String>,
}
