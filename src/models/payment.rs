//! Payment model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::PaymentStatus;

/// Payment record; one per booking
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    /// Gateway name ("stub" for the built-in gateway)
    pub gateway: String,
    /// Order reference returned by the gateway at creation
    pub gateway_order_id: Option<String>,
    pub status: PaymentStatus,
    /// Gateway transaction id, set once paid
    pub transaction_id: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub refunded_amount: Decimal,
    pub refund_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Amount still refundable
    pub fn refundable_balance(&self) -> Decimal {
        (self.amount - self.refunded_amount).max(Decimal::ZERO)
    }
}

/// Payment confirmation from the client after gateway checkout
#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmPayment {
    /// Transaction id reported by the gateway checkout
    pub transaction_id: String,
}

/// Payment failure report
#[derive(Debug, Deserialize, ToSchema)]
pub struct FailPayment {
    pub reason: Option<String>,
}
