//! Place model (a bookable event published by a host)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    policy::RefundPolicy,
};

use super::parse_date;

/// Place record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Place {
    pub id: Uuid,
    pub host_id: Uuid,
    pub name: String,
    pub location: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    /// Price per guest
    pub price: Decimal,
    /// Maximum number of passes per visit date
    pub daily_capacity: i32,
    /// First bookable date
    pub start_date: NaiveDate,
    /// Last bookable date (inclusive)
    pub end_date: NaiveDate,
    pub refundable: bool,
    /// Cap on the refund percentage for cancellations before the visit day
    pub before_visit_percent: i16,
    /// Refund percentage for cancellations on the visit day
    pub same_day_percent: i16,
    pub refund_description: Option<String>,
    pub booking_enabled: bool,
    /// Assigned security staff user ids
    pub security_staff: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Place {
    pub fn refund_policy(&self) -> RefundPolicy {
        RefundPolicy {
            refundable: self.refundable,
            before_visit_percent: self.before_visit_percent.clamp(0, 100) as u8,
            same_day_percent: self.same_day_percent.clamp(0, 100) as u8,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.daily_capacity.max(0) as u32
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn has_security_staff(&self, user_id: Uuid) -> bool {
        self.security_staff.contains(&user_id)
    }
}

/// Validated place fields, ready to be written
#[derive(Debug, Clone)]
pub struct PlaceFields {
    pub name: String,
    pub location: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub daily_capacity: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub refundable: bool,
    pub before_visit_percent: i16,
    pub same_day_percent: i16,
    pub refund_description: Option<String>,
    pub booking_enabled: bool,
}

impl PlaceFields {
    fn check(self) -> AppResult<Self> {
        if self.end_date < self.start_date {
            return Err(AppError::Validation("end_date must not be before start_date".to_string()));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::Validation("price must not be negative".to_string()));
        }
        if self.daily_capacity < 0 {
            return Err(AppError::Validation("daily_capacity must not be negative".to_string()));
        }
        for (name, value) in [
            ("before_visit_percent", self.before_visit_percent),
            ("same_day_percent", self.same_day_percent),
        ] {
            if !(0..=100).contains(&value) {
                return Err(AppError::Validation(format!("{} must be between 0 and 100", name)));
            }
        }
        Ok(self)
    }
}

/// Create place request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePlace {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0, message = "Capacity must not be negative"))]
    pub daily_capacity: i32,
    /// Start date (YYYY-MM-DD)
    pub start_date: String,
    /// End date (YYYY-MM-DD)
    pub end_date: String,
    pub refundable: Option<bool>,
    pub before_visit_percent: Option<i16>,
    pub same_day_percent: Option<i16>,
    pub refund_description: Option<String>,
    pub booking_enabled: Option<bool>,
}

impl CreatePlace {
    pub fn into_fields(self) -> AppResult<PlaceFields> {
        let defaults = RefundPolicy::default();
        PlaceFields {
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            name: self.name,
            location: self.location,
            image_url: self.image_url,
            description: self.description,
            price: self.price,
            daily_capacity: self.daily_capacity,
            refundable: self.refundable.unwrap_or(defaults.refundable),
            before_visit_percent: self
                .before_visit_percent
                .unwrap_or(defaults.before_visit_percent as i16),
            same_day_percent: self.same_day_percent.unwrap_or(defaults.same_day_percent as i16),
            refund_description: self.refund_description,
            booking_enabled: self.booking_enabled.unwrap_or(true),
        }
        .check()
    }
}

/// Update place request; omitted fields keep their current value
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePlace {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: Option<String>,
    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub refundable: Option<bool>,
    pub before_visit_percent: Option<i16>,
    pub same_day_percent: Option<i16>,
    pub refund_description: Option<String>,
    pub booking_enabled: Option<bool>,
}

impl UpdatePlace {
    /// Merge the update over an existing place
    pub fn merge(self, place: &Place) -> AppResult<PlaceFields> {
        PlaceFields {
            start_date: match self.start_date {
                Some(ref s) => parse_date("start_date", s)?,
                None => place.start_date,
            },
            end_date: match self.end_date {
                Some(ref s) => parse_date("end_date", s)?,
                None => place.end_date,
            },
            name: self.name.unwrap_or_else(|| place.name.clone()),
            location: self.location.unwrap_or_else(|| place.location.clone()),
            image_url: self.image_url.or_else(|| place.image_url.clone()),
            description: self.description.or_else(|| place.description.clone()),
            price: self.price.unwrap_or(place.price),
            daily_capacity: place.daily_capacity,
            refundable: self.refundable.unwrap_or(place.refundable),
            before_visit_percent: self.before_visit_percent.unwrap_or(place.before_visit_percent),
            same_day_percent: self.same_day_percent.unwrap_or(place.same_day_percent),
            refund_description: self
                .refund_description
                .or_else(|| place.refund_description.clone()),
            booking_enabled: self.booking_enabled.unwrap_or(place.booking_enabled),
        }
        .check()
    }
}

/// Change daily capacity request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCapacity {
    #[validate(range(min = 0, message = "Capacity must not be negative"))]
    pub daily_capacity: i32,
}

/// Replace the security staff of a place
#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignSecurity {
    pub staff_ids: Vec<Uuid>,
}

/// Query parameters for public place listing
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PlaceQuery {
    /// Search in name or location
    pub search: Option<String>,
    /// Only places still open on or after this date (YYYY-MM-DD)
    pub open_from: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Query parameters for the per-day seat status view
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CapacityQuery {
    /// First date (YYYY-MM-DD), defaults to today or the place start date
    pub from: Option<String>,
    /// Last date (YYYY-MM-DD), defaults to the place end date
    pub to: Option<String>,
}

/// Query parameters for single-date availability
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    /// Visit date (YYYY-MM-DD)
    pub date: String,
}
