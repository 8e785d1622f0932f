//! Passes repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::PassStatus,
        pass::{Pass, PassWithPlace},
    },
};

/// Pass row to insert
#[derive(Debug, Clone)]
pub struct NewPass {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub place_id: Uuid,
    pub visit_date: NaiveDate,
    pub guest_name: String,
    pub slot_number: i32,
    pub qr_payload: String,
}

#[derive(Clone)]
pub struct PassesRepository {
    pool: Pool<Postgres>,
}

impl PassesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Slot numbers held by non-cancelled passes for a place and date
    pub async fn taken_slots(&self, conn: &mut PgConnection, place_id: Uuid, date: NaiveDate) -> AppResult<Vec<i32>> {
        let slots = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT slot_number FROM passes
            WHERE place_id = $1 AND visit_date = $2 AND status <> 'CANCELLED'
            ORDER BY slot_number
            "#,
        )
        .bind(place_id)
        .bind(date)
        .fetch_all(&mut *conn)
        .await?;
        Ok(slots)
    }

    /// Highest slot number held by a non-cancelled pass on or after `from` (0 if none)
    pub async fn max_live_slot(&self, conn: &mut PgConnection, place_id: Uuid, from: NaiveDate) -> AppResult<i32> {
        let slot = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT COALESCE(MAX(slot_number), 0) FROM passes
            WHERE place_id = $1 AND visit_date >= $2 AND status <> 'CANCELLED'
            "#,
        )
        .bind(place_id)
        .bind(from)
        .fetch_one(&mut *conn)
        .await?;
        Ok(slot)
    }

    /// Non-cancelled pass counts per date within `from..=to`
    pub async fn booked_counts(&self, place_id: Uuid, from: NaiveDate, to: NaiveDate) -> AppResult<Vec<(NaiveDate, u32)>> {
        let mut conn = self.pool.acquire().await?;
        self.booked_counts_with(&mut conn, place_id, from, to).await
    }

    /// Same as [`Self::booked_counts`], inside the caller's transaction
    pub async fn booked_counts_with(
        &self,
        conn: &mut PgConnection,
        place_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<(NaiveDate, u32)>> {
        let rows = sqlx::query(
            r#"
            SELECT visit_date, COUNT(*) AS booked
            FROM passes
            WHERE place_id = $1 AND visit_date BETWEEN $2 AND $3 AND status <> 'CANCELLED'
            GROUP BY visit_date
            ORDER BY visit_date
            "#,
        )
        .bind(place_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let date: NaiveDate = r.get("visit_date");
                let booked: i64 = r.get("booked");
                (date, booked.max(0) as u32)
            })
            .collect())
    }

    /// Insert passes inside the caller's transaction
    pub async fn insert_many(&self, conn: &mut PgConnection, passes: &[NewPass]) -> AppResult<Vec<Pass>> {
        let mut created = Vec::with_capacity(passes.len());
        for pass in passes {
            let row = sqlx::query_as::<_, Pass>(
                r#"
                INSERT INTO passes (id, booking_id, place_id, visit_date, guest_name, slot_number, qr_payload)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
                "#,
            )
            .bind(pass.id)
            .bind(pass.booking_id)
            .bind(pass.place_id)
            .bind(pass.visit_date)
            .bind(&pass.guest_name)
            .bind(pass.slot_number)
            .bind(&pass.qr_payload)
            .fetch_one(&mut *conn)
            .await?;
            created.push(row);
        }
        Ok(created)
    }

    /// Get pass by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Pass> {
        sqlx::query_as::<_, Pass>("SELECT * FROM passes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pass {} not found", id)))
    }

    /// Get pass by ID and lock it until the transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Pass> {
        sqlx::query_as::<_, Pass>("SELECT * FROM passes WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pass {} not found", id)))
    }

    /// Passes of a booking, by slot number
    pub async fn list_by_booking(&self, booking_id: Uuid) -> AppResult<Vec<Pass>> {
        let rows = sqlx::query_as::<_, Pass>("SELECT * FROM passes WHERE booking_id = $1 ORDER BY slot_number")
            .bind(booking_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// All passes of a visitor with place names, newest visit first
    pub async fn list_for_visitor(&self, visitor_id: Uuid) -> AppResult<Vec<PassWithPlace>> {
        let rows = sqlx::query_as::<_, PassWithPlace>(
            r#"
            SELECT ps.*, p.name AS place_name, p.location AS place_location
            FROM passes ps
            JOIN bookings b ON b.id = ps.booking_id
            JOIN places p ON p.id = ps.place_id
            WHERE b.visitor_id = $1
            ORDER BY ps.visit_date DESC, ps.slot_number
            "#,
        )
        .bind(visitor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Approve every pending pass of a booking and record the per-guest amount paid
    pub async fn approve_for_booking(&self, conn: &mut PgConnection, booking_id: Uuid, amount_each: Decimal) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE passes SET status = 'APPROVED', amount_paid = $1 WHERE booking_id = $2 AND status = 'PENDING'",
        )
        .bind(amount_each)
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cancel every live pass of a booking without refund (unpaid bookings)
    pub async fn cancel_for_booking(&self, conn: &mut PgConnection, booking_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE passes SET status = 'CANCELLED', cancelled_at = $1 WHERE booking_id = $2 AND status <> 'CANCELLED'",
        )
        .bind(now)
        .bind(booking_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Cancel one pass and record its refund. Only a live pass is updated,
    /// so a second call cannot record a second refund.
    pub async fn cancel(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        refund_amount: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Pass> {
        sqlx::query_as::<_, Pass>(
            r#"
            UPDATE passes SET status = 'CANCELLED', refund_amount = $1, cancelled_at = $2
            WHERE id = $3 AND status <> 'CANCELLED'
            RETURNING *
            "#,
        )
        .bind(refund_amount)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::AlreadyCancelled)
    }

    /// Record the gateway refund id of a cancelled pass
    pub async fn set_refund_reference(&self, id: Uuid, reference: &str) -> AppResult<Pass> {
        sqlx::query_as::<_, Pass>(
            "UPDATE passes SET refund_reference = $1 WHERE id = $2 AND refund_reference IS NULL RETURNING *",
        )
        .bind(reference)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Refund of pass {} is already settled", id)))
    }

    /// Cancelled passes whose refund the gateway has not accepted yet, oldest first.
    /// Recent cancellations are left to the request that made them.
    pub async fn pending_refunds(&self, limit: i64) -> AppResult<Vec<Pass>> {
        let rows = sqlx::query_as::<_, Pass>(
            r#"
            SELECT * FROM passes
            WHERE status = 'CANCELLED' AND refund_amount > 0 AND refund_reference IS NULL
              AND cancelled_at < NOW() - INTERVAL '1 minute'
            ORDER BY cancelled_at
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record check-in time
    pub async fn check_in(&self, conn: &mut PgConnection, id: Uuid, now: DateTime<Utc>) -> AppResult<Pass> {
        sqlx::query_as::<_, Pass>(
            r#"
            UPDATE passes SET checked_in_at = $1
            WHERE id = $2 AND status = 'APPROVED' AND checked_in_at IS NULL
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::Conflict("Pass was checked in concurrently".to_string()))
    }

    /// (live passes, live passes not yet checked in) for a booking
    pub async fn booking_progress(&self, conn: &mut PgConnection, booking_id: Uuid) -> AppResult<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status <> $2) AS live,
                COUNT(*) FILTER (WHERE status <> $2 AND checked_in_at IS NULL) AS waiting
            FROM passes WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .bind(PassStatus::Cancelled)
        .fetch_one(&mut *conn)
        .await?;
        Ok((row.get("live"), row.get("waiting")))
    }
}
