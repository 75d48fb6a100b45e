use axum::{extract::{State, Query}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateSaleRequest, DayQuery};
use crate::api::handlers::branch_or_default;
use crate::domain::models::booking::BOOKING_CONFIRMED;
use crate::domain::models::pos::{is_valid_payment_method, NewPosSale, PosSale, PosSummary, PAYMENT_MEMBERSHIP};
use crate::domain::services::admin_config::load;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn create_sale(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    if !is_valid_payment_method(&payload.payment_method) {
        return Err(AppError::Validation(format!("Unknown payment method: {}", payload.payment_method)));
    }

    let config = load(state.config_repo.as_ref()).await?;
    let today = config.today(Utc::now());

    let booking = match &payload.booking_id {
        Some(id) => {
            let booking = state.booking_repo.find_by_id(id).await?
                .ok_or(AppError::NotFound("Booking not found".into()))?;
            if booking.status != BOOKING_CONFIRMED {
                return Err(AppError::Conflict(format!("A {} booking cannot be charged", booking.status)));
            }
            Some(booking)
        }
        None => None,
    };

    let (branch_id, service_type, vehicle_type, price_cents, customer_id) = match &booking {
        Some(b) => (
            b.branch_id.clone(),
            b.service_type.clone(),
            b.vehicle_type.clone(),
            b.price_cents,
            payload.customer_id.clone().or_else(|| b.user_id.clone()),
        ),
        None => {
            let branch_id = branch_or_default(&config, payload.branch_id.clone())?;
            if config.branch(&branch_id).is_none() {
                return Err(AppError::Validation(format!("Unknown branch: {}", branch_id)));
            }
            let (Some(service), Some(vehicle)) = (payload.service_type.clone(), payload.vehicle_type.clone()) else {
                return Err(AppError::Validation("service_type and vehicle_type are required without a booking".into()));
            };
            let price = config.price_for(&service, &vehicle)
                .ok_or_else(|| AppError::Validation(format!("No price for service {} on vehicle {}", service, vehicle)))?;
            (branch_id, service, vehicle, price, payload.customer_id.clone())
        }
    };

    let amount_cents = if payload.payment_method == PAYMENT_MEMBERSHIP {
        let customer = customer_id.as_deref()
            .ok_or(AppError::Validation("Membership payments need a customer_id".into()))?;
        if state.subscriptions.active_for_user(customer, today).await?.is_none() {
            return Err(AppError::Validation("Customer has no active membership".into()));
        }
        0
    } else {
        price_cents
    };

    let sale = PosSale::new(NewPosSale {
        branch_id,
        booking_id: payload.booking_id.clone(),
        customer_id,
        service_type,
        vehicle_type,
        amount_cents,
        payment_method: payload.payment_method,
        staff_id: user.0.id.clone(),
        sale_date: today,
    });

    let created = match &payload.booking_id {
        Some(booking_id) => state.pos_repo.create_for_booking(&sale, booking_id).await?,
        None => state.pos_repo.create(&sale).await?,
    };

    info!(sale_id = %created.id, amount_cents = created.amount_cents, method = %created.payment_method, "POS sale recorded by {}", user.0.id);

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_sales(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<DayQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let date = match query.date {
        Some(date) => date,
        None => load(state.config_repo.as_ref()).await?.today(Utc::now()),
    };
    Ok(Json(state.pos_repo.list(date, query.branch.as_deref()).await?))
}

pub async fn sales_summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<DayQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let date = match query.date {
        Some(date) => date,
        None => load(state.config_repo.as_ref()).await?.today(Utc::now()),
    };
    let rows = state.pos_repo.totals_by_payment_method(date, query.branch.as_deref()).await?;
    Ok(Json(PosSummary::from_rows(date, query.branch, rows)))
}
