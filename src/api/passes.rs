//! Visitor pass endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        booking::{BookingDetails, PassRequest},
        pass::{CancelResponse, Pass, PassWithPlace},
    },
    policy::RefundQuote,
    AppState,
};

use super::AuthenticatedUser;

/// Book passes for a visit date
#[utoipa::path(
    post,
    path = "/passes/request",
    tag = "passes",
    security(("bearer_auth" = [])),
    request_body = PassRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingDetails),
        (status = 400, description = "Invalid guests or date"),
        (status = 409, description = "Not enough seats left"),
        (status = 422, description = "Place is not bookable on that date")
    )
)]
pub async fn request_pass(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<PassRequest>,
) -> AppResult<(StatusCode, Json<BookingDetails>)> {
    let details = state.services.passes.request(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// My passes
#[utoipa::path(
    get,
    path = "/passes/mine",
    tag = "passes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Passes of the current user", body = Vec<PassWithPlace>)
    )
)]
pub async fn my_passes(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<PassWithPlace>>> {
    let passes = state.services.passes.list_mine(&claims).await?;
    Ok(Json(passes))
}

/// Get a pass
#[utoipa::path(
    get,
    path = "/passes/{id}",
    tag = "passes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pass ID")),
    responses(
        (status = 200, description = "Pass details", body = Pass),
        (status = 403, description = "Not your pass"),
        (status = 404, description = "Pass not found")
    )
)]
pub async fn get_pass(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Pass>> {
    let pass = state.services.passes.get(&claims, id).await?;
    Ok(Json(pass))
}

/// Refund the visitor would get by cancelling now
#[utoipa::path(
    get,
    path = "/passes/{id}/refund-quote",
    tag = "passes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pass ID")),
    responses(
        (status = 200, description = "Refund quote", body = RefundQuote),
        (status = 404, description = "Pass not found"),
        (status = 409, description = "Pass already cancelled"),
        (status = 422, description = "Pass cannot be cancelled")
    )
)]
pub async fn refund_quote(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RefundQuote>> {
    let quote = state.services.passes.refund_quote(&claims, id).await?;
    Ok(Json(quote))
}

/// Cancel a pass and refund it
#[utoipa::path(
    post,
    path = "/passes/cancel/{id}",
    tag = "passes",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Pass ID")),
    responses(
        (status = 200, description = "Pass cancelled", body = CancelResponse),
        (status = 409, description = "Pass already cancelled"),
        (status = 422, description = "Pass cannot be cancelled")
    )
)]
pub async fn cancel_pass(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CancelResponse>> {
    let response = state.services.passes.cancel(&claims, id).await?;
    Ok(Json(response))
}
