//! Payments repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{enums::PaymentStatus, payment::Payment},
};

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a CREATED payment inside the caller's transaction
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        booking_id: Uuid,
        amount: Decimal,
        currency: &str,
        gateway: &str,
        gateway_order_id: &str,
    ) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (id, user_id, booking_id, amount, currency, gateway, gateway_order_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(booking_id)
        .bind(amount)
        .bind(currency)
        .bind(gateway)
        .bind(gateway_order_id)
        .bind(PaymentStatus::Created)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Get payment by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }

    /// Get payment by ID and lock it until the transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment {} not found", id)))
    }

    /// Payment of a booking, if any
    pub async fn get_by_booking(&self, booking_id: Uuid) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Payment of a booking, locked until the transaction ends
    pub async fn lock_by_booking(&self, conn: &mut PgConnection, booking_id: Uuid) -> AppResult<Option<Payment>> {
        let row = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE booking_id = $1 ORDER BY created_at DESC LIMIT 1 FOR UPDATE",
        )
        .bind(booking_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn mark_paid(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        transaction_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET status = $1, transaction_id = $2, payment_date = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(PaymentStatus::Paid)
        .bind(transaction_id)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    pub async fn mark_failed(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>("UPDATE payments SET status = $1 WHERE id = $2 RETURNING *")
            .bind(PaymentStatus::Failed)
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Add a refund to the running refunded total
    pub async fn add_refund(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET refunded_amount = refunded_amount + $1, refund_date = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(amount)
        .bind(now)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}
