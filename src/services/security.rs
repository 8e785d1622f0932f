//! Entry scanning for security staff

use chrono::Utc;

use crate::{
    config::BookingConfig,
    error::{AppError, AppResult},
    models::{
        enums::BookingStatus,
        pass::ScanResponse,
        place::Place,
        user::UserClaims,
    },
    policy::{evaluate_scan, qr, qr::QrError},
    repository::Repository,
};

#[derive(Clone)]
pub struct SecurityService {
    repository: Repository,
    booking: BookingConfig,
}

impl SecurityService {
    pub fn new(repository: Repository, booking: BookingConfig) -> Self {
        Self { repository, booking }
    }

    /// Places the current user guards
    pub async fn assigned_places(&self, claims: &UserClaims) -> AppResult<Vec<Place>> {
        claims.require_security()?;
        self.repository.places.list_by_security(claims.user_id).await
    }

    /// Validate a scanned QR payload and check the pass in when it grants entry
    pub async fn scan(&self, claims: &UserClaims, payload: &str) -> AppResult<ScanResponse> {
        claims.require_security()?;

        let pass_id = qr::parse_pass_id(payload)?;
        let booking_id = match self.repository.passes.get_by_id(pass_id).await {
            Ok(pass) => pass.booking_id,
            Err(AppError::NotFound(_)) => return Err(QrError::BadSignature.into()),
            Err(e) => return Err(e),
        };

        let mut tx = self.repository.begin().await?;

        self.repository.bookings.lock_by_id(&mut tx, booking_id).await?;
        let pass = self.repository.passes.lock_by_id(&mut tx, pass_id).await?;
        qr::verify_payload(&self.booking.qr_secret, payload, pass.id, pass.booking_id)?;

        let place = self.repository.places.get_by_id(pass.place_id).await?;
        if !claims.is_admin() && !place.has_security_staff(claims.user_id) {
            return Err(AppError::Authorization(format!(
                "You are not assigned to {}",
                place.name
            )));
        }

        let verdict = evaluate_scan(
            pass.status,
            pass.visit_date,
            pass.checked_in_at.is_some(),
            self.booking.today(),
        );

        if !verdict.is_admitted() {
            tx.rollback().await?;
            tracing::info!(pass_id = %pass.id, ?verdict, scanned_by = %claims.user_id, "Entry refused");
            return Ok(ScanResponse {
                valid: false,
                verdict,
                message: verdict.reason().to_string(),
                pass,
            });
        }

        let pass = self.repository.passes.check_in(&mut tx, pass.id, Utc::now()).await?;
        let (_, waiting) = self
            .repository
            .passes
            .booking_progress(&mut tx, pass.booking_id)
            .await?;
        if waiting == 0 {
            self.repository
                .bookings
                .set_status(&mut tx, pass.booking_id, BookingStatus::Completed)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            pass_id = %pass.id,
            place_id = %place.id,
            slot = pass.slot_number,
            scanned_by = %claims.user_id,
            "Entry granted"
        );

        Ok(ScanResponse {
            valid: true,
            verdict,
            message: verdict.reason().to_string(),
            pass,
        })
    }
}
