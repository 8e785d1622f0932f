//! Public place catalogue endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::place::{AvailabilityQuery, Place, PlaceQuery},
    policy::DayAvailability,
    AppState,
};

use super::{PaginatedPlaces, PaginatedResponse};

/// List bookable places
#[utoipa::path(
    get,
    path = "/places",
    tag = "places",
    params(PlaceQuery),
    responses(
        (status = 200, description = "Bookable places", body = PaginatedPlaces)
    )
)]
pub async fn list_places(
    State(state): State<AppState>,
    Query(query): Query<PlaceQuery>,
) -> AppResult<Json<PaginatedResponse<Place>>> {
    let (places, total) = state.services.places.list_public(&query).await?;

    Ok(Json(PaginatedResponse {
        items: places,
        total,
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(20).clamp(1, 100),
    }))
}

/// Get place details
#[utoipa::path(
    get,
    path = "/places/{id}",
    tag = "places",
    params(("id" = Uuid, Path, description = "Place ID")),
    responses(
        (status = 200, description = "Place details", body = Place),
        (status = 404, description = "Place not found")
    )
)]
pub async fn get_place(State(state): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Place>> {
    let place = state.services.places.get(id).await?;
    Ok(Json(place))
}

/// Seats left on a visit date
#[utoipa::path(
    get,
    path = "/places/{id}/availability",
    tag = "places",
    params(
        ("id" = Uuid, Path, description = "Place ID"),
        AvailabilityQuery
    ),
    responses(
        (status = 200, description = "Availability for the date", body = DayAvailability),
        (status = 400, description = "Invalid date"),
        (status = 404, description = "Place not found")
    )
)]
pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<DayAvailability>> {
    let day = state.services.places.availability(id, &query.date).await?;
    Ok(Json(day))
}
