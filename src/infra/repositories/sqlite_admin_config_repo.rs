use crate::domain::{models::admin_config::AdminConfigRecord, ports::AdminConfigRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteAdminConfigRepo { pool: SqlitePool }
impl SqliteAdminConfigRepo { pub fn new(pool: SqlitePool) -> Self { Self { pool } } }

#[async_trait]
impl AdminConfigRepository for SqliteAdminConfigRepo {
    async fn get(&self) -> Result<Option<AdminConfigRecord>, AppError> {
        sqlx::query_as::<_, AdminConfigRecord>("SELECT id, config_json, updated_by, updated_at FROM admin_config WHERE id = 1")
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn upsert(&self, config_json: &str, updated_by: Option<&str>) -> Result<AdminConfigRecord, AppError> {
        sqlx::query_as::<_, AdminConfigRecord>(
            "INSERT INTO admin_config (id, config_json, updated_by, updated_at) VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET config_json = excluded.config_json, updated_by = excluded.updated_by, updated_at = excluded.updated_at
             RETURNING id, config_json, updated_by, updated_at"
        )
            .bind(config_json)
            .bind(updated_by)
            .bind(Utc::now())
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
