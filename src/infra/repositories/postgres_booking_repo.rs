use crate::domain::{models::booking::{Booking, BookingFilter, BOOKING_CONFIRMED}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use chrono::{NaiveDate, Utc};

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Serializes writers on one (branch, date, slot) for the rest of the transaction,
    /// then counts the bookings already holding it.
    async fn lock_and_count(tx: &mut Transaction<'_, Postgres>, booking: &Booking) -> Result<i64, AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(booking.slot_key())
            .execute(&mut **tx).await.map_err(AppError::Database)?;

        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM bookings WHERE branch_id = $1 AND booking_date = $2 AND time_slot = $3 AND status != 'cancelled' AND id != $4"
        )
            .bind(&booking.branch_id).bind(booking.booking_date).bind(&booking.time_slot).bind(&booking.id)
            .fetch_one(&mut **tx).await.map_err(AppError::Database)?;
        Ok(row.get::<i64, _>("count"))
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn create_within_capacity(&self, booking: &Booking, capacity: i32) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        if Self::lock_and_count(&mut tx, booking).await? >= i64::from(capacity) {
            return Ok(None);
        }

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, user_id, customer_name, customer_email, customer_phone, branch_id, booking_date, time_slot, service_type, vehicle_type, price_cents, status, notes, reminder_sent, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.user_id).bind(&booking.customer_name).bind(&booking.customer_email)
            .bind(&booking.customer_phone).bind(&booking.branch_id).bind(booking.booking_date).bind(&booking.time_slot)
            .bind(&booking.service_type).bind(&booking.vehicle_type).bind(booking.price_cents).bind(&booking.status)
            .bind(&booking.notes).bind(booking.reminder_sent).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(created))
    }

    async fn reschedule_within_capacity(&self, booking: &Booking, capacity: i32) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        if Self::lock_and_count(&mut tx, booking).await? >= i64::from(capacity) {
            return Ok(None);
        }

        let moved = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET booking_date = $1, time_slot = $2, reminder_sent = $3, updated_at = $4
             WHERE id = $5 AND status = $6
             RETURNING *"
        )
            .bind(booking.booking_date).bind(&booking.time_slot).bind(booking.reminder_sent).bind(booking.updated_at)
            .bind(&booking.id).bind(BOOKING_CONFIRMED)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(moved)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = $1 ORDER BY booking_date DESC, time_slot DESC")
            .bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE ($1::date IS NULL OR booking_date = $1)
             AND ($2::text IS NULL OR branch_id = $2)
             AND ($3::text IS NULL OR status = $3)
             ORDER BY booking_date ASC, time_slot ASC"
        )
            .bind(filter.date)
            .bind(&filter.branch)
            .bind(&filter.status)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_for_day(&self, date: NaiveDate, branch_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_date = $1 AND branch_id = $2 AND status != 'cancelled'")
            .bind(date).bind(branch_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status_if(&self, id: &str, from: &str, to: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *")
            .bind(to).bind(Utc::now()).bind(id).bind(from)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_reminder_candidates(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = 'confirmed' AND reminder_sent = FALSE AND booking_date >= $1 AND booking_date <= $2"
        )
            .bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_reminder_sent(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE bookings SET reminder_sent = TRUE WHERE id = $1").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn count_by_status_for_date(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) as count FROM bookings
             WHERE booking_date = $1 AND ($2::text IS NULL OR branch_id = $2)
             GROUP BY status"
        )
            .bind(date).bind(branch_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok(rows.iter().map(|r| (r.get::<String, _>("status"), r.get::<i64, _>("count"))).collect())
    }
}
