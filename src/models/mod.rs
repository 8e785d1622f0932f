//! Data models for PassHub

pub mod booking;
pub mod enums;
pub mod pass;
pub mod payment;
pub mod place;
pub mod user;

use chrono::NaiveDate;

use crate::error::{AppError, AppResult};

// Re-export commonly used types
pub use booking::{Booking, BookingDetails};
pub use enums::{BookingStatus, PassStatus, PaymentStatus, Role};
pub use pass::Pass;
pub use payment::Payment;
pub use place::Place;
pub use user::{User, UserShort};

/// Parse a `YYYY-MM-DD` request field
pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid {} (expected YYYY-MM-DD)", field)))
}
