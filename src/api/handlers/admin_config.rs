use axum::{extract::{State, Path}, response::IntoResponse, Json};
use chrono::NaiveDate;
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::BlackoutDateRequest;
use crate::domain::models::admin_config::AdminConfig;
use crate::domain::services::admin_config::{load, save};
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn get_config(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load(state.config_repo.as_ref()).await?))
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Json(payload): Json<AdminConfig>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    let saved = save(state.config_repo.as_ref(), payload, Some(&admin.0.id)).await?;
    Ok(Json(saved))
}

pub async fn add_blackout_date(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Json(payload): Json<BlackoutDateRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    let mut config = load(state.config_repo.as_ref()).await?;
    config.blackout_dates.push(payload.date);
    let saved = save(state.config_repo.as_ref(), config, Some(&admin.0.id)).await?;
    info!("Blackout date {} added", payload.date);
    Ok(Json(saved))
}

pub async fn remove_blackout_date(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Path(date): Path<NaiveDate>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    let mut config = load(state.config_repo.as_ref()).await?;
    if !config.is_blackout(date) {
        return Err(AppError::NotFound(format!("{} is not a blackout date", date)));
    }
    config.blackout_dates.retain(|d| *d != date);
    let saved = save(state.config_repo.as_ref(), config, Some(&admin.0.id)).await?;
    info!("Blackout date {} removed", date);
    Ok(Json(saved))
}
