use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateBookingRequest, RescheduleRequest};
use crate::api::handlers::branch_or_default;
use crate::domain::models::admin_config::{parse_hhmm, AdminConfig};
use crate::domain::models::booking::{
    Booking, BookingFilter, NewBookingParams, BOOKING_CANCELLED, BOOKING_COMPLETED, BOOKING_CONFIRMED,
};
use crate::domain::models::notification::{KIND_BOOKING_CANCELLED, KIND_BOOKING_CONFIRMED, KIND_BOOKING_RESCHEDULED};
use crate::domain::models::user::normalize_email;
use crate::domain::services::admin_config::load;
use crate::domain::services::notification_service::booking_context;
use crate::domain::services::availability::{check_slot, normalize_time_slot, slot_start_utc, SlotQuery, SlotRejection};
use crate::error::AppError;
use std::sync::Arc;
use tracing::{error, info, warn};

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let config = load(state.config_repo.as_ref()).await?;
    let branch_id = branch_or_default(&config, payload.branch_id)?;

    let existing = state.booking_repo.list_active_for_day(payload.date, &branch_id).await?;
    let query = SlotQuery { date: payload.date, time_slot: &payload.time_slot, branch_id: &branch_id, exclude_booking: None };
    let slot = check_slot(&config, &query, &existing, Utc::now())?;
    let time_slot = normalize_time_slot(&payload.time_slot).ok_or(SlotRejection::InvalidTimeSlot)?;

    let price_cents = config.price_for(&payload.service_type, &payload.vehicle_type)
        .ok_or_else(|| AppError::Validation(format!(
            "No price for service {} on vehicle {}", payload.service_type, payload.vehicle_type
        )))?;

    let (user_id, customer_name, customer_email) = if user.0.is_staff() {
        let owner = match &payload.user_id {
            Some(id) => Some(state.user_repo.find_by_id(id).await?
                .ok_or(AppError::NotFound("Customer not found".into()))?),
            None => None,
        };
        let name = payload.customer_name.clone().or_else(|| owner.as_ref().map(|o| o.name.clone()));
        let email = payload.customer_email.as_deref().map(normalize_email).or_else(|| owner.as_ref().map(|o| o.email.clone()));
        match (name, email) {
            (Some(name), Some(email)) if !name.trim().is_empty() && email.contains('@') => {
                (owner.map(|o| o.id), name.trim().to_string(), email)
            }
            _ => return Err(AppError::Validation("customer_name and customer_email are required".into())),
        }
    } else {
        let name = payload.customer_name.clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| user.0.name.clone());
        (Some(user.0.id.clone()), name, user.0.email.clone())
    };

    let booking = Booking::new(NewBookingParams {
        user_id,
        customer_name,
        customer_email,
        customer_phone: payload.customer_phone,
        branch_id,
        booking_date: payload.date,
        time_slot,
        service_type: payload.service_type,
        vehicle_type: payload.vehicle_type,
        price_cents,
        notes: payload.notes,
    });

    let created = state.booking_repo.create_within_capacity(&booking, slot.capacity).await?
        .ok_or_else(|| {
            warn!(slot = %booking.slot_key(), "Slot filled up by a concurrent booking");
            AppError::from(SlotRejection::FullyBooked)
        })?;

    info!(booking_id = %created.id, slot = %created.slot_key(), "Booking created by {}", user.0.id);
    notify_owner(&state, &config, &created, KIND_BOOKING_CONFIRMED).await;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_my_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.booking_repo.list_by_user(&user.0.id).await?))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(filter): Query<BookingFilter>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    Ok(Json(state.booking_repo.list(&filter).await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(find_visible(&state, &user, &booking_id).await?))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = find_visible(&state, &user, &booking_id).await?;

    match booking.status.as_str() {
        BOOKING_CANCELLED => return Ok(Json(booking)),
        BOOKING_COMPLETED => return Err(AppError::Conflict("A completed booking cannot be cancelled".into())),
        _ => {}
    }

    let config = load(state.config_repo.as_ref()).await?;
    if !user.0.is_staff() && has_started(&config, &booking) {
        return Err(AppError::Conflict("This booking has already started".into()));
    }

    let Some(cancelled) = state.booking_repo.update_status_if(&booking.id, BOOKING_CONFIRMED, BOOKING_CANCELLED).await? else {
        // Lost a race with another status change; a concurrent cancel still counts as success.
        let current = state.booking_repo.find_by_id(&booking.id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        return match current.status.as_str() {
            BOOKING_CANCELLED => Ok(Json(current)),
            status => Err(AppError::Conflict(format!("A {} booking cannot be cancelled", status))),
        };
    };
    info!(booking_id = %cancelled.id, "Booking cancelled by {}", user.0.id);
    notify_owner(&state, &config, &cancelled, KIND_BOOKING_CANCELLED).await;

    Ok(Json(cancelled))
}

pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
    Json(payload): Json<RescheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut booking = find_visible(&state, &user, &booking_id).await?;
    if booking.status != BOOKING_CONFIRMED {
        return Err(AppError::Conflict(format!("A {} booking cannot be rescheduled", booking.status)));
    }

    let config = load(state.config_repo.as_ref()).await?;
    if !user.0.is_staff() && has_started(&config, &booking) {
        return Err(AppError::Conflict("This booking has already started".into()));
    }

    let existing = state.booking_repo.list_active_for_day(payload.date, &booking.branch_id).await?;
    let query = SlotQuery {
        date: payload.date,
        time_slot: &payload.time_slot,
        branch_id: &booking.branch_id,
        exclude_booking: Some(&booking.id),
    };
    let slot = check_slot(&config, &query, &existing, Utc::now())?;

    booking.booking_date = payload.date;
    booking.time_slot = normalize_time_slot(&payload.time_slot).ok_or(SlotRejection::InvalidTimeSlot)?;
    booking.reminder_sent = false;
    booking.updated_at = Utc::now();

    let Some(moved) = state.booking_repo.reschedule_within_capacity(&booking, slot.capacity).await? else {
        let still_confirmed = state.booking_repo.find_by_id(&booking.id).await?
            .is_some_and(|b| b.status == BOOKING_CONFIRMED);
        if !still_confirmed {
            warn!(booking_id = %booking.id, "Booking changed status while being rescheduled");
            return Err(AppError::Conflict("Booking was changed by another request".into()));
        }
        warn!(slot = %booking.slot_key(), "Reschedule lost the slot to a concurrent booking");
        return Err(SlotRejection::FullyBooked.into());
    };

    info!(booking_id = %moved.id, slot = %moved.slot_key(), "Booking rescheduled by {}", user.0.id);
    notify_owner(&state, &config, &moved, KIND_BOOKING_RESCHEDULED).await;

    Ok(Json(moved))
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let booking = state.booking_repo.find_by_id(&booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    if booking.status != BOOKING_CONFIRMED {
        return Err(AppError::Conflict(format!("A {} booking cannot be completed", booking.status)));
    }

    let completed = state.booking_repo.update_status_if(&booking.id, BOOKING_CONFIRMED, BOOKING_COMPLETED).await?
        .ok_or(AppError::Conflict("Booking was changed by another request".into()))?;
    info!(booking_id = %completed.id, "Booking completed by {}", user.0.id);
    Ok(Json(completed))
}

/// Bookings are visible to their owner and to staff; everyone else gets a 404.
async fn find_visible(state: &AppState, user: &AuthUser, booking_id: &str) -> Result<Booking, AppError> {
    let booking = state.booking_repo.find_by_id(booking_id).await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;

    if !user.0.is_staff() && !booking.is_owned_by(&user.0.id) {
        return Err(AppError::NotFound("Booking not found".into()));
    }
    Ok(booking)
}

fn has_started(config: &AdminConfig, booking: &Booking) -> bool {
    parse_hhmm(&booking.time_slot)
        .and_then(|time| slot_start_utc(config, booking.booking_date, time))
        .is_some_and(|start| start <= Utc::now())
}

async fn notify_owner(state: &AppState, config: &AdminConfig, booking: &Booking, kind: &str) {
    let Some(user_id) = &booking.user_id else { return };
    if let Err(e) = state.notifications.notify(user_id, kind, &booking_context(config, booking)).await {
        error!(booking_id = %booking.id, "Failed to create {} notification: {:?}", kind, e);
    }
}
