//! Booking model and pass request types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{enums::BookingStatus, pass::Pass, payment::Payment};

/// Booking record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub place_id: Uuid,
    pub visit_date: NaiveDate,
    /// Guest names, one pass each
    #[schema(value_type = Vec<String>)]
    pub guests: Json<Vec<String>>,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Booking with its passes and payment
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingDetails {
    pub booking: Booking,
    pub passes: Vec<Pass>,
    pub payment: Option<Payment>,
}

/// Pass request (book a visit for one or more guests)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PassRequest {
    pub place_id: Uuid,
    /// Visit date (YYYY-MM-DD)
    pub visit_date: String,
    /// Guest names
    #[validate(length(min = 1, message = "At least one guest is required"))]
    pub guests: Vec<String>,
}

impl PassRequest {
    /// Trimmed guest names, or the index of the first blank one
    pub fn guest_names(&self) -> Result<Vec<String>, usize> {
        self.guests
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    Err(i)
                } else {
                    Ok(trimmed.to_string())
                }
            })
            .collect()
    }
}

/// Query parameters for a host's booking list
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    /// Filter by visit date (YYYY-MM-DD)
    pub date: Option<String>,
    pub status: Option<BookingStatus>,
}
