use crate::domain::{models::pos::PosSale, ports::PosRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Executor, PgPool, Postgres, Row};

pub struct PostgresPosRepo {
    pool: PgPool,
}

impl PostgresPosRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert<'e, E>(executor: E, sale: &PosSale) -> Result<PosSale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, PosSale>(
            "INSERT INTO pos_sales (id, branch_id, booking_id, customer_id, service_type, vehicle_type, amount_cents, payment_method, staff_id, sale_date, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *"
        )
            .bind(&sale.id).bind(&sale.branch_id).bind(&sale.booking_id).bind(&sale.customer_id)
            .bind(&sale.service_type).bind(&sale.vehicle_type).bind(sale.amount_cents).bind(&sale.payment_method)
            .bind(&sale.staff_id).bind(sale.sale_date).bind(sale.created_at)
            .fetch_one(executor).await.map_err(AppError::Database)
    }
}

#[async_trait]
impl PosRepository for PostgresPosRepo {
    async fn create(&self, sale: &PosSale) -> Result<PosSale, AppError> {
        Self::insert(&self.pool, sale).await
    }

    async fn create_for_booking(&self, sale: &PosSale, booking_id: &str) -> Result<PosSale, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let result = sqlx::query("UPDATE bookings SET status = 'completed', updated_at = $1 WHERE id = $2 AND status = 'confirmed'")
            .bind(Utc::now()).bind(booking_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict("Booking is not awaiting payment".into()));
        }
        let created = Self::insert(&mut *tx, sale).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn list(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<PosSale>, AppError> {
        sqlx::query_as::<_, PosSale>(
            "SELECT * FROM pos_sales WHERE sale_date = $1 AND ($2::text IS NULL OR branch_id = $2) ORDER BY created_at ASC"
        )
            .bind(date).bind(branch_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn totals_by_payment_method(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<(String, i64, i64)>, AppError> {
        let rows = sqlx::query(
            "SELECT payment_method, COUNT(*) as count, CAST(COALESCE(SUM(amount_cents), 0) AS BIGINT) as total
             FROM pos_sales WHERE sale_date = $1 AND ($2::text IS NULL OR branch_id = $2)
             GROUP BY payment_method"
        )
            .bind(date).bind(branch_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok(rows.iter()
            .map(|r| (r.get::<String, _>("payment_method"), r.get::<i64, _>("count"), r.get::<i64, _>("total")))
            .collect())
    }
}
