use crate::domain::{models::notification::Notification, ports::NotificationRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_NOTIFICATION: &str =
    "INSERT INTO notifications (id, user_id, kind, title, message, is_read, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)";

#[async_trait]
impl NotificationRepository for PostgresNotificationRepo {
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
            "SELECT * FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR is_read = FALSE) ORDER BY created_at DESC"
        )
            .bind(user_id).bind(unread_only)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_read(&self, user_id: &str, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id).bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
