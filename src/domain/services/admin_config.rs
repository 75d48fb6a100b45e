use crate::domain::models::admin_config::AdminConfig;
use crate::domain::ports::AdminConfigRepository;
use crate::error::AppError;
use tracing::{error, info};

/// Stored business configuration, or the built-in default when none was saved yet.
pub async fn load(repo: &dyn AdminConfigRepository) -> Result<AdminConfig, AppError> {
    match repo.get().await? {
        Some(record) => serde_json::from_str(&record.config_json).map_err(|e| {
            error!("Stored admin config is unreadable: {}", e);
            AppError::InternalWithMsg(format!("Stored admin config is unreadable: {}", e))
        }),
        None => Ok(AdminConfig::default()),
    }
}

pub async fn save(
    repo: &dyn AdminConfigRepository,
    mut config: AdminConfig,
    updated_by: Option<&str>,
) -> Result<AdminConfig, AppError> {
    config.normalize();
    config.validate().map_err(AppError::Validation)?;

    let json = serde_json::to_string(&config)
        .map_err(|e| AppError::InternalWithMsg(format!("Config serialization failed: {}", e)))?;
    repo.upsert(&json, updated_by).await?;

    info!(updated_by = ?updated_by, "Admin config saved");
    Ok(config)
}
