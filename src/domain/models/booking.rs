use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

pub const BOOKING_CONFIRMED: &str = "confirmed";
pub const BOOKING_COMPLETED: &str = "completed";
pub const BOOKING_CANCELLED: &str = "cancelled";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub user_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub branch_id: String,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub service_type: String,
    pub vehicle_type: String,
    pub price_cents: i64,
    pub status: String,
    pub notes: Option<String>,
    pub reminder_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub user_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub branch_id: String,
    pub booking_date: NaiveDate,
    pub time_slot: String,
    pub service_type: String,
    pub vehicle_type: String,
    pub price_cents: i64,
    pub notes: Option<String>,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: params.user_id,
            customer_name: params.customer_name,
            customer_email: params.customer_email,
            customer_phone: params.customer_phone,
            branch_id: params.branch_id,
            booking_date: params.booking_date,
            time_slot: params.time_slot,
            service_type: params.service_type,
            vehicle_type: params.vehicle_type,
            price_cents: params.price_cents,
            status: BOOKING_CONFIRMED.to_string(),
            notes: params.notes,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BOOKING_CANCELLED
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }

    /// Key used to serialize concurrent writers competing for one slot.
    pub fn slot_key(&self) -> String {
        format!("{}|{}|{}", self.branch_id, self.booking_date, self.time_slot)
    }
}

/// Admin-side listing filter. Unset fields match everything.
#[derive(Debug, Default, Deserialize)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub branch: Option<String>,
    pub status: Option<String>,
}
