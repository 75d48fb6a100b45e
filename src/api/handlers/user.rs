use axum::{extract::{State, Path}, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{CreateUserRequest, UpdateUserRequest};
use crate::domain::models::auth::UserProfile;
use crate::domain::models::user::{is_valid_role, normalize_email, User, ROLE_ADMIN};
use crate::domain::services::auth_service::{hash_password, validate_password};
use std::sync::Arc;
use crate::error::AppError;
use tracing::{info, error};

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    let users = state.user_repo.list().await?;
    let profiles: Vec<UserProfile> = users.iter().map(UserProfile::from).collect();
    Ok(Json(profiles))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;

    if !is_valid_role(&payload.role) {
        return Err(AppError::Validation(format!("Unknown role: {}", payload.role)));
    }
    let email = normalize_email(&payload.email);
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email address is required".into()));
    }
    validate_password(&payload.password)?;

    if state.user_repo.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("An account with this email already exists".into()));
    }

    let user = User::new(email, payload.name.trim().to_string(), hash_password(&payload.password)?, &payload.role);
    let created = state.user_repo.create(&user).await?;

    info!("Admin {} created {} account {}", admin.0.id, created.role, created.id);

    Ok((StatusCode::CREATED, Json(UserProfile::from(&created))))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;

    let mut target = state.user_repo.find_by_id(&user_id).await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    if admin.0.id == target.id {
        if payload.active == Some(false) {
            return Err(AppError::Conflict("Cannot deactivate yourself".into()));
        }
        if payload.role.as_deref().is_some_and(|r| r != ROLE_ADMIN) {
            return Err(AppError::Conflict("Cannot remove your own admin role".into()));
        }
    }

    if let Some(name) = payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".into()));
        }
        target.name = name.trim().to_string();
    }
    if let Some(role) = payload.role {
        if !is_valid_role(&role) {
            return Err(AppError::Validation(format!("Unknown role: {}", role)));
        }
        target.role = role;
    }
    let deactivated = payload.active == Some(false) && target.active;
    if let Some(active) = payload.active {
        target.active = active;
    }

    let updated = state.user_repo.update(&target).await?;

    if deactivated && let Err(e) = state.auth_service.revoke_all(&updated.id).await {
        error!("Failed to revoke sessions of deactivated user {}: {:?}", updated.id, e);
    }

    info!("Admin {} updated user {}", admin.0.id, updated.id);
    Ok(Json(UserProfile::from(&updated)))
}
