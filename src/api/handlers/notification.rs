use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::auth::AuthUser;
use crate::api::dtos::requests::{NotificationListQuery, SendNotificationRequest};
use crate::api::dtos::responses::CountResponse;
use crate::domain::models::user::ROLE_CUSTOMER;
use crate::error::AppError;
use std::sync::Arc;
use tracing::info;

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.notification_repo.list_by_user(&user.0.id, query.unread).await?))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(notification_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.notification_repo.mark_read(&user.0.id, &notification_id).await? {
        return Err(AppError::NotFound("Notification not found".into()));
    }
    Ok(Json(serde_json::json!({"status": "read"})))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let count = state.notification_repo.mark_all_read(&user.0.id).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    admin: AuthUser,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin()?;
    if payload.title.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(AppError::Validation("Title and message are required".into()));
    }

    let recipients: Vec<String> = match payload.user_id {
        Some(user_id) => {
            let target = state.user_repo.find_by_id(&user_id).await?
                .ok_or(AppError::NotFound("User not found".into()))?;
            vec![target.id]
        }
        None => state.user_repo.list_active_by_role(ROLE_CUSTOMER).await?
            .into_iter()
            .map(|u| u.id)
            .collect(),
    };

    let count = state.notifications.announce(&recipients, payload.title.trim(), payload.message.trim()).await?;
    info!("Admin {} sent an announcement to {} users", admin.0.id, count);

    Ok(Json(CountResponse { count: count as u64 }))
}
