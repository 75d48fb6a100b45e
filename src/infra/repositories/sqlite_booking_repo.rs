use crate::domain::{models::booking::{Booking, BookingFilter, BOOKING_CONFIRMED}, ports::BookingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::{SqlitePool, Row};
use chrono::{NaiveDate, Utc};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// A write statement takes SQLite's write lock before it reads, so the count
// and the insert/update below cannot interleave with another writer.
const ACTIVE_IN_SLOT: &str =
    "(SELECT COUNT(*) FROM bookings WHERE branch_id = ? AND booking_date = ? AND time_slot = ? AND status != 'cancelled' AND id != ?)";

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_within_capacity(&self, booking: &Booking, capacity: i32) -> Result<Option<Booking>, AppError> {
        let sql = format!(
            "INSERT INTO bookings (id, user_id, customer_name, customer_email, customer_phone, branch_id, booking_date, time_slot, service_type, vehicle_type, price_cents, status, notes, reminder_sent, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE {} < ?
             RETURNING *",
            ACTIVE_IN_SLOT
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(&booking.id).bind(&booking.user_id).bind(&booking.customer_name).bind(&booking.customer_email)
            .bind(&booking.customer_phone).bind(&booking.branch_id).bind(booking.booking_date).bind(&booking.time_slot)
            .bind(&booking.service_type).bind(&booking.vehicle_type).bind(booking.price_cents).bind(&booking.status)
            .bind(&booking.notes).bind(booking.reminder_sent).bind(booking.created_at).bind(booking.updated_at)
            .bind(&booking.branch_id).bind(booking.booking_date).bind(&booking.time_slot).bind(&booking.id)
            .bind(capacity)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn reschedule_within_capacity(&self, booking: &Booking, capacity: i32) -> Result<Option<Booking>, AppError> {
        let sql = format!(
            "UPDATE bookings SET booking_date = ?, time_slot = ?, reminder_sent = ?, updated_at = ?
             WHERE id = ? AND status = ? AND {} < ?
             RETURNING *",
            ACTIVE_IN_SLOT
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(booking.booking_date).bind(&booking.time_slot).bind(booking.reminder_sent).bind(booking.updated_at)
            .bind(&booking.id).bind(BOOKING_CONFIRMED)
            .bind(&booking.branch_id).bind(booking.booking_date).bind(&booking.time_slot).bind(&booking.id)
            .bind(capacity)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE user_id = ? ORDER BY booking_date DESC, time_slot DESC")
            .bind(user_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE (? IS NULL OR booking_date = ?)
             AND (? IS NULL OR branch_id = ?)
             AND (? IS NULL OR status = ?)
             ORDER BY booking_date ASC, time_slot ASC"
        )
            .bind(filter.date).bind(filter.date)
            .bind(&filter.branch).bind(&filter.branch)
            .bind(&filter.status).bind(&filter.status)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_active_for_day(&self, date: NaiveDate, branch_id: &str) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE booking_date = ? AND branch_id = ? AND status != 'cancelled'")
            .bind(date).bind(branch_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_status_if(&self, id: &str, from: &str, to: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ? RETURNING *")
            .bind(to).bind(Utc::now()).bind(id).bind(from)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_reminder_candidates(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = 'confirmed' AND reminder_sent = 0 AND booking_date >= ? AND booking_date <= ?"
        )
            .bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn mark_reminder_sent(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE bookings SET reminder_sent = 1 WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }

    async fn count_by_status_for_date(&self, date: NaiveDate, branch_id: Option<&str>) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) as count FROM bookings
             WHERE booking_date = ? AND (? IS NULL OR branch_id = ?)
             GROUP BY status"
        )
            .bind(date).bind(branch_id).bind(branch_id).fetch_all(&self.pool).await.map_err(AppError::Database)?;
        Ok(rows.iter().map(|r| (r.get::<String, _>("status"), r.get::<i64, _>("count"))).collect())
    }
}
