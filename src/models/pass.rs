//! Pass model (one guest's entry ticket)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::policy::{RefundQuote, ScanVerdict};

use super::enums::PassStatus;

/// Pass record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Pass {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub place_id: Uuid,
    pub visit_date: NaiveDate,
    pub guest_name: String,
    /// Slot number within the day's capacity (1-based)
    pub slot_number: i32,
    /// Payload to encode in the QR code
    pub qr_payload: String,
    pub status: PassStatus,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub amount_paid: Decimal,
    pub refund_amount: Option<Decimal>,
    /// Gateway refund id; unset while a refund is still owed
    pub refund_reference: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Pass joined with its place, for visitor listings
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PassWithPlace {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub pass: Pass,
    pub place_name: String,
    pub place_location: String,
}

/// Pass cancellation result
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelResponse {
    pub pass: Pass,
    pub refund: RefundQuote,
    /// The refund is recorded but the gateway has not accepted it yet
    pub refund_pending: bool,
}

/// Scan request from security staff
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Decoded QR payload
    pub qr_payload: String,
}

/// Scan result
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScanResponse {
    pub valid: bool,
    pub verdict: ScanVerdict,
    pub message: String,
    pub pass: Pass,
}
