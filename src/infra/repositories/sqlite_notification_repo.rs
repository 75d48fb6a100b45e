use crate::domain::{models::notification::Notification, ports::NotificationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteNotificationRepo {
    pool: SqlitePool,
}

impl SqliteNotificationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const INSERT_NOTIFICATION: &str =
    "INSERT INTO notifications (id, user_id, kind, title, message, is_read, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)";

#[async_trait]
impl NotificationRepository for SqliteNotificationRepo {
    async fn create(&self, n: &Notification) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>(&format!("{} RETURNING *", INSERT_NOTIFICATION))
            .bind(&n.id).bind(&n.user_id).bind(&n.kind).bind(&n.title).bind(&n.message).bind(n.is_read).bind(n.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_many(&self, notifications: &[Notification]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        for n in notifications {
            sqlx::query(INSERT_NOTIFICATION)
                .bind(&n.id).bind(&n.user_id).bind(&n.kind).bind(&n.title).bind(&n.message).bind(n.is_read).bind(n.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>, AppError> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = ? AND (? = 0 OR is_read = 0) ORDER BY created_at DESC"
        )
            .bind(user_id).bind(unread_only)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id).bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
            .bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
