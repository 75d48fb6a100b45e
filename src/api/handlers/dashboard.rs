use axum::{extract::{State, Query}, response::IntoResponse, Json};
use chrono::Utc;
use std::collections::BTreeMap;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::DayQuery;
use crate::api::dtos::responses::DashboardResponse;
use crate::domain::models::booking::{BOOKING_CANCELLED, BOOKING_COMPLETED, BOOKING_CONFIRMED};
use crate::domain::models::pos::PosSummary;
use crate::domain::services::admin_config::load;
use crate::error::AppError;
use std::sync::Arc;

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<DayQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let date = match query.date {
        Some(date) => date,
        None => load(state.config_repo.as_ref()).await?.today(Utc::now()),
    };

    let mut bookings_by_status: BTreeMap<String, i64> = [BOOKING_CONFIRMED, BOOKING_COMPLETED, BOOKING_CANCELLED]
        .into_iter()
        .map(|s| (s.to_string(), 0))
        .collect();
    for (status, count) in state.booking_repo.count_by_status_for_date(date, query.branch.as_deref()).await? {
        bookings_by_status.insert(status, count);
    }

    let revenue_rows = state.pos_repo.totals_by_payment_method(date, query.branch.as_deref()).await?;

    Ok(Json(DashboardResponse {
        date,
        bookings_total: bookings_by_status.values().sum(),
        bookings_by_status,
        revenue: PosSummary::from_rows(date, query.branch, revenue_rows),
        subscriptions: state.subscriptions.stats().await?,
        low_stock_items: state.inventory_repo.count_low_stock().await?,
    }))
}
