//! Pass booking and cancellation service

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::{
        booking::{BookingDetails, PassRequest},
        enums::{BookingStatus, PassStatus},
        parse_date,
        pass::{CancelResponse, Pass, PassWithPlace},
        payment::Payment,
        place::Place,
        user::UserClaims,
    },
    policy::{allocate_slots, qr, RefundQuote},
    repository::{passes::NewPass, Repository},
};

use super::{
    gateway::PaymentGateway,
    payments::{issue_refund, refund_due},
};

/// Pending refunds handled per retry round
const REFUND_RETRY_BATCH: i64 = 100;

#[derive(Clone)]
pub struct PassesService {
    repository: Repository,
    booking: BookingConfig,
    gateway: Arc<dyn PaymentGateway>,
}

/// Check that `place` takes bookings for `visit_date`
pub fn ensure_bookable(place: &Place, visit_date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if !place.booking_enabled {
        return Err(AppError::BookingClosed(format!("Bookings for {} are closed", place.name)));
    }
    if visit_date < today {
        return Err(AppError::BookingClosed("Visit date is in the past".to_string()));
    }
    if !place.is_open_on(visit_date) {
        return Err(AppError::BookingClosed(format!(
            "{} can only be visited from {} to {}",
            place.name, place.start_date, place.end_date
        )));
    }
    Ok(())
}

/// Check that `pass` can still be cancelled for a refund
pub fn ensure_cancellable(pass: &Pass) -> AppResult<()> {
    match pass.status {
        PassStatus::Cancelled => return Err(AppError::AlreadyCancelled),
        PassStatus::Pending => {
            return Err(AppError::BusinessRule(
                "Pass is awaiting payment; cancel the payment instead".to_string(),
            ))
        }
        PassStatus::Approved => {}
    }
    if pass.checked_in_at.is_some() {
        return Err(AppError::BusinessRule("Pass has already been used".to_string()));
    }
    Ok(())
}

impl PassesService {
    pub fn new(repository: Repository, booking: BookingConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repository, booking, gateway }
    }

    /// Book a visit: allocate one slot per guest and open a payment.
    /// Free places are confirmed immediately without a payment.
    pub async fn request(&self, claims: &UserClaims, request: PassRequest) -> AppResult<BookingDetails> {
        claims.require_visitor()?;
        request.validate()?;

        let guests = request
            .guest_names()
            .map_err(|i| AppError::Validation(format!("Guest #{} has no name", i + 1)))?;
        if guests.len() as u32 > self.booking.max_guests_per_booking {
            return Err(AppError::Validation(format!(
                "At most {} guests per booking",
                self.booking.max_guests_per_booking
            )));
        }
        let visit_date = parse_date("visit_date", &request.visit_date)?;
        let today = self.booking.today();

        // Priced before taking the place lock; the gateway is never awaited under it
        let priced = self.repository.places.get_by_id(request.place_id).await?;
        ensure_bookable(&priced, visit_date, today)?;
        let total = priced.price * Decimal::from(guests.len());
        let booking_id = Uuid::new_v4();
        let order = if total > Decimal::ZERO {
            Some(
                self.gateway
                    .create_order(total, &self.booking.currency, booking_id)
                    .await?,
            )
        } else {
            None
        };

        let mut tx = self.repository.begin().await?;

        // Serializes concurrent bookings of the same place
        let place = self.repository.places.lock_by_id(&mut tx, request.place_id).await?;
        ensure_bookable(&place, visit_date, today)?;
        if place.price != priced.price {
            return Err(AppError::Conflict("Place price changed; please retry".to_string()));
        }

        let taken = self
            .repository
            .passes
            .taken_slots(&mut tx, place.id, visit_date)
            .await?;
        let slots = allocate_slots(guests.len() as u32, place.capacity(), &taken)?;

        let booking = self
            .repository
            .bookings
            .insert(
                &mut tx,
                booking_id,
                claims.user_id,
                place.id,
                visit_date,
                &guests,
                total,
                &self.booking.currency,
            )
            .await?;

        let new_passes: Vec<NewPass> = guests
            .iter()
            .zip(slots)
            .map(|(guest, slot_number)| {
                let id = Uuid::new_v4();
                NewPass {
                    id,
                    booking_id: booking.id,
                    place_id: place.id,
                    visit_date,
                    guest_name: guest.clone(),
                    slot_number,
                    qr_payload: qr::encode_payload(&self.booking.qr_secret, id, booking.id),
                }
            })
            .collect();
        self.repository.passes.insert_many(&mut tx, &new_passes).await?;

        if let Some(order) = &order {
            self.repository
                .payments
                .insert(
                    &mut tx,
                    claims.user_id,
                    booking.id,
                    total,
                    &self.booking.currency,
                    self.gateway.name(),
                    &order.order_id,
                )
                .await?;
        } else {
            self.repository
                .passes
                .approve_for_booking(&mut tx, booking.id, Decimal::ZERO)
                .await?;
            self.repository
                .bookings
                .set_status(&mut tx, booking.id, BookingStatus::Confirmed)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            booking_id = %booking.id,
            place_id = %place.id,
            %visit_date,
            guests = guests.len(),
            "Booking created"
        );

        self.booking_details(booking.id).await
    }

    /// Passes of the current user
    pub async fn list_mine(&self, claims: &UserClaims) -> AppResult<Vec<PassWithPlace>> {
        self.repository.passes.list_for_visitor(claims.user_id).await
    }

    /// Pass details, visible to the visitor, the place host, and admins
    pub async fn get(&self, claims: &UserClaims, id: Uuid) -> AppResult<Pass> {
        let pass = self.repository.passes.get_by_id(id).await?;
        let booking = self.repository.bookings.get_by_id(pass.booking_id).await?;
        if booking.visitor_id != claims.user_id {
            let place = self.repository.places.get_by_id(pass.place_id).await?;
            claims.require_owner(place.host_id)?;
        }
        Ok(pass)
    }

    /// Refund the visitor would get by cancelling now
    pub async fn refund_quote(&self, claims: &UserClaims, id: Uuid) -> AppResult<RefundQuote> {
        let pass = self.repository.passes.get_by_id(id).await?;
        let booking = self.repository.bookings.get_by_id(pass.booking_id).await?;
        claims.require_owner(booking.visitor_id)?;
        ensure_cancellable(&pass)?;
        let place = self.repository.places.get_by_id(pass.place_id).await?;
        Ok(self.quote_for(&place, &pass))
    }

    fn quote_for(&self, place: &Place, pass: &Pass) -> RefundQuote {
        place
            .refund_policy()
            .quote(self.booking.today(), pass.visit_date, pass.amount_paid)
    }

    /// Cancel one approved pass and refund it according to the place policy.
    /// The cancellation and refund amount are committed before the gateway is
    /// called; a refund the gateway rejects stays pending and is retried.
    pub async fn cancel(&self, claims: &UserClaims, id: Uuid) -> AppResult<CancelResponse> {
        let booking_id = self.repository.passes.get_by_id(id).await?.booking_id;

        let mut tx = self.repository.begin().await?;

        // Lock order: booking, then passes, then payment
        let booking = self.repository.bookings.lock_by_id(&mut tx, booking_id).await?;
        claims.require_owner(booking.visitor_id)?;
        let pass = self.repository.passes.lock_by_id(&mut tx, id).await?;
        ensure_cancellable(&pass)?;

        let place = self.repository.places.get_by_id(pass.place_id).await?;
        let mut quote = self.quote_for(&place, &pass);

        let now = Utc::now();
        let payment = self.repository.payments.lock_by_booking(&mut tx, booking.id).await?;
        let due = payment
            .as_ref()
            .map(|payment| refund_due(payment, quote.amount))
            .unwrap_or(Decimal::ZERO);
        if let Some(payment) = payment.as_ref().filter(|_| due > Decimal::ZERO) {
            self.repository
                .payments
                .add_refund(&mut tx, payment.id, due, now)
                .await?;
        }
        quote.amount = due;

        let cancelled = self.repository.passes.cancel(&mut tx, pass.id, due, now).await?;

        let (live, waiting) = self.repository.passes.booking_progress(&mut tx, booking.id).await?;
        if live == 0 {
            self.repository
                .bookings
                .set_status(&mut tx, booking.id, BookingStatus::Cancelled)
                .await?;
        } else if waiting == 0 {
            self.repository
                .bookings
                .set_status(&mut tx, booking.id, BookingStatus::Completed)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            pass_id = %cancelled.id,
            booking_id = %booking.id,
            percent = quote.percent,
            refund = %due,
            "Pass cancelled"
        );

        let mut refund_pending = false;
        let cancelled = match payment.filter(|_| due > Decimal::ZERO) {
            Some(payment) => match self.settle_refund(&payment, &cancelled).await {
                Ok(settled) => settled,
                Err(e) => {
                    tracing::warn!(pass_id = %cancelled.id, error = %e, "Refund left pending");
                    refund_pending = true;
                    cancelled
                }
            },
            None => cancelled,
        };

        Ok(CancelResponse {
            pass: cancelled,
            refund: quote,
            refund_pending,
        })
    }

    /// Send the recorded refund of a cancelled pass to the gateway
    async fn settle_refund(&self, payment: &Payment, pass: &Pass) -> AppResult<Pass> {
        let amount = pass.refund_amount.unwrap_or(Decimal::ZERO);
        let refund_id = issue_refund(self.gateway.as_ref(), payment, amount, &pass.id.to_string()).await?;
        self.repository.passes.set_refund_reference(pass.id, &refund_id).await
    }

    /// Retry refunds that were recorded but not accepted by the gateway.
    /// Returns how many were settled.
    pub async fn retry_pending_refunds(&self) -> AppResult<usize> {
        let pending = self.repository.passes.pending_refunds(REFUND_RETRY_BATCH).await?;
        let mut settled = 0;
        for pass in pending {
            let Some(payment) = self.repository.payments.get_by_booking(pass.booking_id).await? else {
                tracing::error!(pass_id = %pass.id, "Pending refund has no payment");
                continue;
            };
            match self.settle_refund(&payment, &pass).await {
                Ok(_) => settled += 1,
                Err(e) => tracing::warn!(pass_id = %pass.id, error = %e, "Refund retry failed"),
            }
        }
        if settled > 0 {
            tracing::info!(settled, "Pending refunds settled");
        }
        Ok(settled)
    }

    /// Booking with its passes and payment
    pub async fn booking_details(&self, booking_id: Uuid) -> AppResult<BookingDetails> {
        Ok(BookingDetails {
            booking: self.repository.bookings.get_by_id(booking_id).await?,
            passes: self.repository.passes.list_by_booking(booking_id).await?,
            payment: self.repository.payments.get_by_booking(booking_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    fn place(booking_enabled: bool) -> Place {
        Place {
            id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            name: "Harbour Lights".to_string(),
            location: "Pier 4".to_string(),
            image_url: None,
            description: None,
            price: Decimal::new(12000, 2),
            daily_capacity: 50,
            start_date: date(10),
            end_date: date(20),
            refundable: true,
            before_visit_percent: 100,
            same_day_percent: 0,
            refund_description: None,
            booking_enabled,
            security_staff: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn pass(status: PassStatus, checked_in: bool) -> Pass {
        Pass {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            place_id: Uuid::new_v4(),
            visit_date: date(12),
            guest_name: "Asha".to_string(),
            slot_number: 1,
            qr_payload: String::new(),
            status,
            checked_in_at: checked_in.then(Utc::now),
            amount_paid: Decimal::new(12000, 2),
            refund_amount: None,
            refund_reference: None,
            cancelled_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_unused_approved_pass_is_cancellable() {
        assert!(ensure_cancellable(&pass(PassStatus::Approved, false)).is_ok());
        assert!(matches!(
            ensure_cancellable(&pass(PassStatus::Cancelled, false)),
            Err(AppError::AlreadyCancelled)
        ));
        assert!(matches!(
            ensure_cancellable(&pass(PassStatus::Pending, false)),
            Err(AppError::BusinessRule(_))
        ));
        assert!(matches!(
            ensure_cancellable(&pass(PassStatus::Approved, true)),
            Err(AppError::BusinessRule(_))
        ));
    }

    #[test]
    fn test_bookable_within_range() {
        assert!(ensure_bookable(&place(true), date(12), date(1)).is_ok());
        assert!(ensure_bookable(&place(true), date(10), date(10)).is_ok());
        assert!(ensure_bookable(&place(true), date(20), date(15)).is_ok());
    }

    #[test]
    fn test_not_bookable_when_disabled() {
        assert!(matches!(
            ensure_bookable(&place(false), date(12), date(1)),
            Err(AppError::BookingClosed(_))
        ));
    }

    #[test]
    fn test_not_bookable_outside_range_or_past() {
        assert!(ensure_bookable(&place(true), date(21), date(1)).is_err());
        assert!(ensure_bookable(&place(true), date(9), date(1)).is_err());
        assert!(ensure_bookable(&place(true), date(12), date(13)).is_err());
    }
}
