//! Payment settlement endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        booking::BookingDetails,
        payment::{ConfirmPayment, FailPayment, Payment},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Get a payment
#[utoipa::path(
    get,
    path = "/payments/{id}",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = Payment),
        (status = 404, description = "Payment not found")
    )
)]
pub async fn get_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Payment>> {
    let payment = state.services.payments.get(&claims, id).await?;
    Ok(Json(payment))
}

/// Confirm a payment with the gateway transaction id
#[utoipa::path(
    post,
    path = "/payments/{id}/confirm",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = ConfirmPayment,
    responses(
        (status = 200, description = "Booking confirmed", body = BookingDetails),
        (status = 409, description = "Payment already settled"),
        (status = 502, description = "Gateway rejected the transaction")
    )
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<ConfirmPayment>,
) -> AppResult<Json<BookingDetails>> {
    let details = state
        .services
        .payments
        .confirm(&claims, id, &request.transaction_id)
        .await?;
    Ok(Json(details))
}

/// Mark a payment as failed and release its slots
#[utoipa::path(
    post,
    path = "/payments/{id}/fail",
    tag = "payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = FailPayment,
    responses(
        (status = 200, description = "Booking cancelled", body = BookingDetails),
        (status = 409, description = "Payment already settled")
    )
)]
pub async fn fail_payment(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<FailPayment>,
) -> AppResult<Json<BookingDetails>> {
    let details = state
        .services
        .payments
        .fail(&claims, id, request.reason.as_deref())
        .await?;
    Ok(Json(details))
}
