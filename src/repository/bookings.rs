//! Bookings repository

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{types::Json, PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{booking::Booking, enums::BookingStatus},
};

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a pending booking inside the caller's transaction
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        visitor_id: Uuid,
        place_id: Uuid,
        visit_date: NaiveDate,
        guests: &[String],
        total_amount: Decimal,
        currency: &str,
    ) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (id, visitor_id, place_id, visit_date, guests, total_amount, currency, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(visitor_id)
        .bind(place_id)
        .bind(visit_date)
        .bind(Json(guests))
        .bind(total_amount)
        .bind(currency)
        .bind(BookingStatus::Pending)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Get booking by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Get booking by ID and lock it until the transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    pub async fn set_status(&self, conn: &mut PgConnection, id: Uuid, status: BookingStatus) -> AppResult<()> {
        sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Bookings for a place, optionally filtered by visit date and status
    pub async fn list_for_place(
        &self,
        place_id: Uuid,
        date: Option<NaiveDate>,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE place_id = $1
              AND ($2::date IS NULL OR visit_date = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY visit_date, created_at
            "#,
        )
        .bind(place_id)
        .bind(date)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
