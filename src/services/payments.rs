//! Payment settlement service

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        booking::BookingDetails,
        enums::{BookingStatus, PaymentStatus},
        payment::Payment,
        user::UserClaims,
    },
    repository::Repository,
};

use super::gateway::PaymentGateway;

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
    gateway: Arc<dyn PaymentGateway>,
}

/// Reject anything but a CREATED payment
pub fn ensure_open(payment: &Payment) -> AppResult<()> {
    match payment.status {
        PaymentStatus::Created => Ok(()),
        status => Err(AppError::Conflict(format!("Payment is already {}", status))),
    }
}

/// Ask the gateway whether the transaction settles this payment's order
pub async fn verify_with_gateway(gateway: &dyn PaymentGateway, payment: &Payment, transaction_id: &str) -> AppResult<()> {
    ensure_open(payment)?;
    let order_id = payment.gateway_order_id.as_deref().unwrap_or_default();
    if gateway.verify_payment(order_id, transaction_id).await? {
        Ok(())
    } else {
        Err(AppError::PaymentGateway("Payment could not be verified".to_string()))
    }
}

/// Part of `amount` that can be refunded against `payment`: nothing unless it
/// is PAID, and never more than what is left to refund.
pub fn refund_due(payment: &Payment, amount: Decimal) -> Decimal {
    if payment.status != PaymentStatus::Paid {
        return Decimal::ZERO;
    }
    amount.min(payment.refundable_balance()).max(Decimal::ZERO)
}

/// Send an already recorded refund to the gateway. `reference` identifies
/// the refund so a retry is not paid out twice. Returns the gateway refund id.
pub async fn issue_refund(
    gateway: &dyn PaymentGateway,
    payment: &Payment,
    amount: Decimal,
    reference: &str,
) -> AppResult<String> {
    let transaction_id = payment
        .transaction_id
        .as_deref()
        .ok_or_else(|| AppError::Internal(format!("Paid payment {} has no transaction id", payment.id)))?;
    let refund_id = gateway.refund(transaction_id, amount, reference).await?;
    tracing::info!(payment_id = %payment.id, %amount, reference, refund_id = %refund_id, "Refund issued");
    Ok(refund_id)
}

/// Per-guest share of a booking total
pub fn amount_per_guest(total: Decimal, guests: usize) -> Decimal {
    if guests == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(guests)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl PaymentsService {
    pub fn new(repository: Repository, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { repository, gateway }
    }

    pub async fn get(&self, claims: &UserClaims, id: Uuid) -> AppResult<Payment> {
        let payment = self.repository.payments.get_by_id(id).await?;
        claims.require_owner(payment.user_id)?;
        Ok(payment)
    }

    /// Mark a payment PAID after gateway verification; confirms the booking and approves its passes
    pub async fn confirm(&self, claims: &UserClaims, id: Uuid, transaction_id: &str) -> AppResult<BookingDetails> {
        let booking_id = self.repository.payments.get_by_id(id).await?.booking_id;

        let mut tx = self.repository.begin().await?;

        let booking = self.repository.bookings.lock_by_id(&mut tx, booking_id).await?;
        let payment = self.repository.payments.lock_by_id(&mut tx, id).await?;
        claims.require_owner(payment.user_id)?;

        if booking.status != BookingStatus::Pending {
            return Err(AppError::Conflict(format!("Booking is already {}", booking.status)));
        }

        verify_with_gateway(self.gateway.as_ref(), &payment, transaction_id).await?;

        let payment = self
            .repository
            .payments
            .mark_paid(&mut tx, payment.id, transaction_id.trim(), Utc::now())
            .await?;
        let amount_each = amount_per_guest(booking.total_amount, booking.guests.len());
        self.repository
            .passes
            .approve_for_booking(&mut tx, booking.id, amount_each)
            .await?;
        self.repository
            .bookings
            .set_status(&mut tx, booking.id, BookingStatus::Confirmed)
            .await?;

        tx.commit().await?;

        tracing::info!(payment_id = %payment.id, booking_id = %booking.id, "Payment confirmed");

        self.details(payment.booking_id).await
    }

    /// Mark a payment FAILED; cancels the booking and frees its slots
    pub async fn fail(&self, claims: &UserClaims, id: Uuid, reason: Option<&str>) -> AppResult<BookingDetails> {
        let booking_id = self.repository.payments.get_by_id(id).await?.booking_id;

        let mut tx = self.repository.begin().await?;

        self.repository.bookings.lock_by_id(&mut tx, booking_id).await?;
        let payment = self.repository.payments.lock_by_id(&mut tx, id).await?;
        claims.require_owner(payment.user_id)?;
        ensure_open(&payment)?;

        self.repository.payments.mark_failed(&mut tx, payment.id).await?;
        let freed = self
            .repository
            .passes
            .cancel_for_booking(&mut tx, payment.booking_id, Utc::now())
            .await?;
        self.repository
            .bookings
            .set_status(&mut tx, payment.booking_id, BookingStatus::Cancelled)
            .await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            booking_id = %payment.booking_id,
            freed,
            reason = reason.unwrap_or("unspecified"),
            "Payment failed"
        );

        self.details(payment.booking_id).await
    }

    async fn details(&self, booking_id: Uuid) -> AppResult<BookingDetails> {
        Ok(BookingDetails {
            booking: self.repository.bookings.get_by_id(booking_id).await?,
            passes: self.repository.passes.list_by_booking(booking_id).await?,
            payment: self.repository.payments.get_by_booking(booking_id).await?,
        })
    }
}
