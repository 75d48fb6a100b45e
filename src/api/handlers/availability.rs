use axum::{extract::{State, Query}, response::IntoResponse, Json};
use chrono::Utc;
use crate::state::AppState;
use crate::api::dtos::requests::{AvailabilityQuery, SlotCheckQuery};
use crate::api::dtos::responses::{AvailabilityResponse, SlotCheckResponse};
use crate::api::handlers::branch_or_default;
use crate::domain::services::admin_config::load;
use crate::domain::services::availability::{check_slot, list_slots, SlotQuery};
use crate::error::AppError;
use std::sync::Arc;

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let config = load(state.config_repo.as_ref()).await?;
    let branch = branch_or_default(&config, query.branch)?;

    let bookings = state.booking_repo.list_active_for_day(query.date, &branch).await?;
    let slots = list_slots(&config, query.date, &branch, &bookings, Utc::now());

    Ok(Json(AvailabilityResponse { date: query.date, branch, slots }))
}

pub async fn check_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotCheckQuery>,
) -> Result<impl IntoResponse, AppError> {
    let config = load(state.config_repo.as_ref()).await?;
    let branch = branch_or_default(&config, query.branch)?;

    let bookings = state.booking_repo.list_active_for_day(query.date, &branch).await?;
    let slot = SlotQuery { date: query.date, time_slot: &query.time_slot, branch_id: &branch, exclude_booking: None };

    let response = match check_slot(&config, &slot, &bookings, Utc::now()) {
        Ok(_) => SlotCheckResponse { available: true, reason: None },
        Err(rejection) => SlotCheckResponse { available: false, reason: Some(rejection.message().to_string()) },
    };
    Ok(Json(response))
}
