use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use std::collections::BTreeMap;

pub const PAYMENT_CASH: &str = "cash";
pub const PAYMENT_CARD: &str = "card";
pub const PAYMENT_MEMBERSHIP: &str = "membership";

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct PosSale {
    pub id: String,
    pub branch_id: String,
    pub booking_id: Option<String>,
    pub customer_id: Option<String>,
    pub service_type: String,
    pub vehicle_type: String,
    pub amount_cents: i64,
    pub payment_method: String,
    pub staff_id: String,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

pub struct NewPosSale {
    pub branch_id: String,
    pub booking_id: Option<String>,
    pub customer_id: Option<String>,
    pub service_type: String,
    pub vehicle_type: String,
    pub amount_cents: i64,
    pub payment_method: String,
    pub staff_id: String,
    pub sale_date: NaiveDate,
}

impl PosSale {
    pub fn new(params: NewPosSale) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            branch_id: params.branch_id,
            booking_id: params.booking_id,
            customer_id: params.customer_id,
            service_type: params.service_type,
            vehicle_type: params.vehicle_type,
            amount_cents: params.amount_cents,
            payment_method: params.payment_method,
            staff_id: params.staff_id,
            sale_date: params.sale_date,
            created_at: Utc::now(),
        }
    }
}

pub fn is_valid_payment_method(method: &str) -> bool {
    matches!(method, PAYMENT_CASH | PAYMENT_CARD | PAYMENT_MEMBERSHIP)
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct PaymentTotals {
    pub count: i64,
    pub total_cents: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct PosSummary {
    pub date: NaiveDate,
    pub branch: Option<String>,
    pub sales_count: i64,
    pub total_cents: i64,
    pub by_payment_method: BTreeMap<String, PaymentTotals>,
}

impl PosSummary {
    pub fn from_rows(date: NaiveDate, branch: Option<String>, rows: Vec<(String, i64, i64)>) -> Self {
        let mut by_payment_method = BTreeMap::new();
        let mut sales_count = 0;
        let mut total_cents = 0;
        for (method, count, total) in rows {
            sales_count += count;
            total_cents += total;
            by_payment_method.insert(method, PaymentTotals { count, total_cents: total });
        }
        Self { date, branch, sales_count, total_cents, by_payment_method }
    }
}
