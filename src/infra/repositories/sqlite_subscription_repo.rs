use crate::domain::{models::subscription::SubscriptionRequest, ports::SubscriptionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

pub struct SqliteSubscriptionRepo {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepo {
    async fn create(&self, request: &SubscriptionRequest) -> Result<SubscriptionRequest, AppError> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "INSERT INTO subscription_requests (id, user_id, package_type, branch_id, vehicle_plate, notes, status, admin_note, reviewed_by, reviewed_at, valid_from, valid_until, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&request.id)
            .bind(&request.user_id)
            .bind(&request.package_type)
            .bind(&request.branch_id)
            .bind(&request.vehicle_plate)
            .bind(&request.notes)
            .bind(&request.status)
            .bind(&request.admin_note)
            .bind(&request.reviewed_by)
            .bind(request.reviewed_at)
            .bind(request.valid_from)
            .bind(request.valid_until)
            .bind(request.created_at)
            .bind(request.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SubscriptionRequest>, AppError> {
        sqlx::query_as::<_, SubscriptionRequest>("SELECT * FROM subscription_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<SubscriptionRequest>, AppError> {
        sqlx::query_as::<_, SubscriptionRequest>("SELECT * FROM subscription_requests WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, status: Option<&str>) -> Result<Vec<SubscriptionRequest>, AppError> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests WHERE (? IS NULL OR status = ?) ORDER BY created_at ASC"
        )
            .bind(status)
            .bind(status)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_if_status(&self, request: &SubscriptionRequest, expected_status: &str) -> Result<Option<SubscriptionRequest>, AppError> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "UPDATE subscription_requests
             SET status = ?, admin_note = ?, reviewed_by = ?, reviewed_at = ?, valid_from = ?, valid_until = ?, updated_at = ?
             WHERE id = ? AND status = ?
             RETURNING *"
        )
            .bind(&request.status)
            .bind(&request.admin_note)
            .bind(&request.reviewed_by)
            .bind(request.reviewed_at)
            .bind(request.valid_from)
            .bind(request.valid_until)
            .bind(request.updated_at)
            .bind(&request.id)
            .bind(expected_status)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_status(&self) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query("SELECT status, COUNT(*) as count FROM subscription_requests GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(rows.iter().map(|r| (r.get::<String, _>("status"), r.get::<i64, _>("count"))).collect())
    }

    async fn list_expired_approvals(&self, today: NaiveDate) -> Result<Vec<SubscriptionRequest>, AppError> {
        sqlx::query_as::<_, SubscriptionRequest>(
            "SELECT * FROM subscription_requests WHERE status = 'approved' AND valid_until < ?"
        )
            .bind(today)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
