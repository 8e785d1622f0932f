//! Security staff endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{
        pass::{ScanRequest, ScanResponse},
        place::Place,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Places I am assigned to
#[utoipa::path(
    get,
    path = "/security/places",
    tag = "security",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assigned places", body = Vec<Place>),
        (status = 403, description = "Security role required")
    )
)]
pub async fn assigned_places(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Place>>> {
    let places = state.services.security.assigned_places(&claims).await?;
    Ok(Json(places))
}

/// Validate a scanned pass and check it in
#[utoipa::path(
    post,
    path = "/security/scan-pass",
    tag = "security",
    security(("bearer_auth" = [])),
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Scan verdict", body = ScanResponse),
        (status = 400, description = "Malformed or forged QR payload"),
        (status = 403, description = "Not assigned to this place")
    )
)]
pub async fn scan_pass(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ScanRequest>,
) -> AppResult<Json<ScanResponse>> {
    let response = state.services.security.scan(&claims, &request.qr_payload).await?;
    Ok(Json(response))
}
