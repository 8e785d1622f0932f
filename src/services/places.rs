//! Place publishing, capacity and availability service

use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::{
        booking::{Booking, BookingQuery},
        enums::Role,
        parse_date,
        place::{AssignSecurity, CapacityQuery, CreatePlace, Place, PlaceQuery, UpdateCapacity, UpdatePlace},
        user::UserClaims,
    },
    policy::{slots::availability_range, slots::peak_booked, DayAvailability},
    repository::Repository,
};

/// Longest date range served by the capacity view
pub const MAX_RANGE_DAYS: i64 = 366;

#[derive(Clone)]
pub struct PlacesService {
    repository: Repository,
    booking: BookingConfig,
}

/// Resolve the capacity view range for a place.
/// Returns `None` when the place has no bookable day left.
pub fn capacity_range(
    place: &Place,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<Option<(NaiveDate, NaiveDate)>> {
    let explicit = from.is_some() && to.is_some();
    let from = from.unwrap_or_else(|| today.max(place.start_date));
    let to = to.unwrap_or(place.end_date);

    if from > to {
        if explicit {
            return Err(AppError::Validation("from must not be after to".to_string()));
        }
        return Ok(None);
    }
    if (to - from).num_days() >= MAX_RANGE_DAYS {
        return Err(AppError::Validation(format!(
            "Date range must not exceed {} days",
            MAX_RANGE_DAYS
        )));
    }
    Ok(Some((from, to)))
}

impl PlacesService {
    pub fn new(repository: Repository, booking: BookingConfig) -> Self {
        Self { repository, booking }
    }

    /// Public listing of bookable places
    pub async fn list_public(&self, query: &PlaceQuery) -> AppResult<(Vec<Place>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let open_from = query
            .open_from
            .as_deref()
            .map(|s| parse_date("open_from", s))
            .transpose()?;
        self.repository
            .places
            .list_public(query.search.as_deref(), open_from, page, per_page)
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Place> {
        self.repository.places.get_by_id(id).await
    }

    /// Seats left for one visit date
    pub async fn availability(&self, id: Uuid, date: &str) -> AppResult<DayAvailability> {
        let date = parse_date("date", date)?;
        let place = self.repository.places.get_by_id(id).await?;
        if !place.is_open_on(date) {
            return Ok(DayAvailability::new(date, 0, 0));
        }
        let booked = self.repository.passes.booked_counts(place.id, date, date).await?;
        Ok(DayAvailability::new(date, place.capacity(), peak_booked(&booked)))
    }

    /// Places owned by the current host
    pub async fn list_mine(&self, claims: &UserClaims) -> AppResult<Vec<Place>> {
        claims.require_host()?;
        self.repository.places.list_by_host(claims.user_id).await
    }

    pub async fn create(&self, claims: &UserClaims, request: CreatePlace) -> AppResult<Place> {
        claims.require_host()?;
        request.validate()?;
        let fields = request.into_fields()?;
        let place = self.repository.places.create(claims.user_id, &fields).await?;
        tracing::info!(place_id = %place.id, host_id = %claims.user_id, "Place created");
        Ok(place)
    }

    pub async fn update(&self, claims: &UserClaims, id: Uuid, request: UpdatePlace) -> AppResult<Place> {
        let place = self.owned_place(claims, id).await?;
        request.validate()?;
        let fields = request.merge(&place)?;
        self.repository.places.update(place.id, &fields).await
    }

    /// Delete a place that never had a booking
    pub async fn delete(&self, claims: &UserClaims, id: Uuid) -> AppResult<()> {
        let place = self.owned_place(claims, id).await?;
        if self.repository.places.has_bookings(place.id).await? {
            return Err(AppError::Conflict(
                "Place has bookings; disable booking instead".to_string(),
            ));
        }
        self.repository.places.delete(place.id).await?;
        tracing::info!(place_id = %place.id, "Place deleted");
        Ok(())
    }

    /// Per-day seat status over a date range
    pub async fn capacity_status(
        &self,
        claims: &UserClaims,
        id: Uuid,
        query: &CapacityQuery,
    ) -> AppResult<Vec<DayAvailability>> {
        let place = self.owned_place(claims, id).await?;
        let from = query.from.as_deref().map(|s| parse_date("from", s)).transpose()?;
        let to = query.to.as_deref().map(|s| parse_date("to", s)).transpose()?;

        let Some((from, to)) = capacity_range(&place, from, to, self.booking.today())? else {
            return Ok(Vec::new());
        };
        let booked = self.repository.passes.booked_counts(place.id, from, to).await?;
        Ok(availability_range(from, to, place.capacity(), &booked))
    }

    /// Change the daily capacity. Refused if it would strand a pass booked for today or later.
    pub async fn update_capacity(&self, claims: &UserClaims, id: Uuid, request: UpdateCapacity) -> AppResult<Place> {
        claims.require_host()?;
        request.validate()?;
        let today = self.booking.today();

        let mut tx = self.repository.begin().await?;

        // Same lock as booking, so no pass is allocated while we check
        let place = self.repository.places.lock_by_id(&mut tx, id).await?;
        claims.require_owner(place.host_id)?;

        let from = today.max(place.start_date);
        let to = place.end_date.max(from);
        let booked = self
            .repository
            .passes
            .booked_counts_with(&mut tx, place.id, from, to)
            .await?;
        let peak = peak_booked(&booked);
        if (request.daily_capacity as u32) < peak {
            return Err(AppError::BusinessRule(format!(
                "{} passes are already booked for a single day",
                peak
            )));
        }
        let highest_slot = self.repository.passes.max_live_slot(&mut tx, place.id, from).await?;
        if request.daily_capacity < highest_slot {
            return Err(AppError::BusinessRule(format!(
                "Slot {} is already assigned on an upcoming day",
                highest_slot
            )));
        }

        self.repository
            .places
            .set_capacity(&mut tx, place.id, request.daily_capacity)
            .await?;
        tx.commit().await?;

        tracing::info!(
            place_id = %place.id,
            old = place.daily_capacity,
            new = request.daily_capacity,
            "Daily capacity changed"
        );

        self.repository.places.get_by_id(place.id).await
    }

    /// Replace the security staff of a place; every id must be a SECURITY user
    pub async fn assign_security(&self, claims: &UserClaims, id: Uuid, request: AssignSecurity) -> AppResult<Place> {
        let place = self.owned_place(claims, id).await?;

        let staff: Vec<Uuid> = request
            .staff_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let found = self
            .repository
            .users
            .count_with_role(&staff, Role::Security)
            .await?;
        if found != staff.len() as i64 {
            return Err(AppError::Validation(
                "Every assigned user must exist and have the SECURITY role".to_string(),
            ));
        }

        let place = self.repository.places.set_security_staff(place.id, &staff).await?;
        tracing::info!(place_id = %place.id, staff = staff.len(), "Security staff assigned");
        Ok(place)
    }

    /// Bookings of an owned place
    pub async fn bookings(&self, claims: &UserClaims, id: Uuid, query: &BookingQuery) -> AppResult<Vec<Booking>> {
        let place = self.owned_place(claims, id).await?;
        let date = query.date.as_deref().map(|s| parse_date("date", s)).transpose()?;
        self.repository
            .bookings
            .list_for_place(place.id, date, query.status)
            .await
    }

    async fn owned_place(&self, claims: &UserClaims, id: Uuid) -> AppResult<Place> {
        claims.require_host()?;
        let place = self.repository.places.get_by_id(id).await?;
        claims.require_owner(place.host_id)?;
        Ok(place)
    }
}
