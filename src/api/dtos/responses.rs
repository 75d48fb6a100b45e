use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::models::pos::PosSummary;
use crate::domain::services::availability::SlotStatus;
use crate::domain::services::subscription_service::SubscriptionStats;

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub date: NaiveDate,
    pub branch: String,
    pub slots: Vec<SlotStatus>,
}

#[derive(Serialize)]
pub struct SlotCheckResponse {
    pub available: bool,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub date: NaiveDate,
    pub bookings_by_status: BTreeMap<String, i64>,
    pub bookings_total: i64,
    pub revenue: PosSummary,
    pub subscriptions: SubscriptionStats,
    pub low_stock_items: i64,
}
