pub mod admin_config;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod notification;
pub mod pos;
pub mod subscription;
pub mod user;

use crate::domain::models::admin_config::AdminConfig;
use crate::error::AppError;

/// Branch named by the request, or the first active branch when none was given.
pub(crate) fn branch_or_default(config: &AdminConfig, requested: Option<String>) -> Result<String, AppError> {
    match requested {
        Some(id) => Ok(id),
        None => config.default_branch()
            .map(|b| b.id.clone())
            .ok_or(AppError::Validation("No active branch is configured".into())),
    }
}
