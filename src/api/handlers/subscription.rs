use axum::{extract::{State, Path, Query}, response::IntoResponse, Json, http::StatusCode};
use chrono::Utc;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{
    ApproveSubscriptionRequest, CreateSubscriptionRequest, RejectSubscriptionRequest, SubscriptionListQuery,
};
use crate::domain::models::subscription::{NewSubscriptionRequest, SubscriptionStatus};
use crate::domain::services::admin_config::load;
use crate::error::AppError;
use std::sync::Arc;

pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let config = load(state.config_repo.as_ref()).await?;
    let params = NewSubscriptionRequest {
        user_id: user.0.id.clone(),
        package_type: payload.package_type,
        branch_id: payload.branch_id,
        vehicle_plate: payload.vehicle_plate,
        notes: payload.notes,
    };
    let created = state.subscriptions.submit(&config, params, config.today(Utc::now())).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_my_subscriptions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.subscription_repo.list_by_user(&user.0.id).await?))
}

pub async fn get_active_subscription(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let config = load(state.config_repo.as_ref()).await?;
    let active = state.subscriptions.active_for_user(&user.0.id, config.today(Utc::now())).await?
        .ok_or(AppError::NotFound("No active membership".into()))?;
    Ok(Json(active))
}

pub async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.subscriptions.cancel_by_owner(&user.0.id, &request_id).await?))
}

pub async fn list_subscriptions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<SubscriptionListQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<SubscriptionStatus>().map_err(AppError::Validation)?),
        None => None,
    };
    let requests = state.subscription_repo.list(status.map(|s| s.as_str())).await?;
    Ok(Json(requests))
}

pub async fn subscription_stats(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    Ok(Json(state.subscriptions.stats().await?))
}

pub async fn review_subscription(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_staff()?;
    let config = load(state.config_repo.as_ref()).await?;
    Ok(Json(state.subscriptions.mark_under_review(&config, &request_id, &user.0.id).await?))
}

pub async fn approve_subscription(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Path(request_id): Path<String>,
    Json(payload): Json<ApproveSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    let config = load(state.config_repo.as_ref()).await?;
    let note = payload.note.filter(|n| !n.trim().is_empty());
    let approved = state.subscriptions.approve(&config, &request_id, &admin.0.id, note, Utc::now()).await?;
    Ok(Json(approved))
}

pub async fn reject_subscription(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Path(request_id): Path<String>,
    Json(payload): Json<RejectSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    let config = load(state.config_repo.as_ref()).await?;
    Ok(Json(state.subscriptions.reject(&config, &request_id, &admin.0.id, payload.reason).await?))
}
