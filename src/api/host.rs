//! Host endpoints: place publishing, capacity and staff management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        booking::{Booking, BookingQuery},
        place::{AssignSecurity, CapacityQuery, CreatePlace, Place, UpdateCapacity, UpdatePlace},
    },
    policy::DayAvailability,
    AppState,
};

use super::AuthenticatedUser;

/// List my places
#[utoipa::path(
    get,
    path = "/host/places",
    tag = "host",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Places owned by the host", body = Vec<Place>),
        (status = 403, description = "Host role required")
    )
)]
pub async fn list_my_places(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Place>>> {
    let places = state.services.places.list_mine(&claims).await?;
    Ok(Json(places))
}

/// Publish a place
#[utoipa::path(
    post,
    path = "/host/places",
    tag = "host",
    security(("bearer_auth" = [])),
    request_body = CreatePlace,
    responses(
        (status = 201, description = "Place created", body = Place),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Host role required")
    )
)]
pub async fn create_place(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreatePlace>,
) -> AppResult<(StatusCode, Json<Place>)> {
    let place = state.services.places.create(&claims, request).await?;
    Ok((StatusCode::CREATED, Json(place)))
}

/// Update a place
#[utoipa::path(
    put,
    path = "/host/places/{id}",
    tag = "host",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Place ID")),
    request_body = UpdatePlace,
    responses(
        (status = 200, description = "Place updated", body = Place),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Place not found")
    )
)]
pub async fn update_place(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePlace>,
) -> AppResult<Json<Place>> {
    let place = state.services.places.update(&claims, id, request).await?;
    Ok(Json(place))
}

/// Delete a place that has no bookings
#[utoipa::path(
    delete,
    path = "/host/places/{id}",
    tag = "host",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Place ID")),
    responses(
        (status = 204, description = "Place deleted"),
        (status = 404, description = "Place not found"),
        (status = 409, description = "Place has bookings")
    )
)]
pub async fn delete_place(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.places.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Per-day seat status
#[utoipa::path(
    get,
    path = "/host/places/{id}/capacity",
    tag = "host",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Place ID"),
        CapacityQuery
    ),
    responses(
        (status = 200, description = "Seat status per day", body = Vec<DayAvailability>),
        (status = 400, description = "Invalid range")
    )
)]
pub async fn capacity_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<CapacityQuery>,
) -> AppResult<Json<Vec<DayAvailability>>> {
    let days = state.services.places.capacity_status(&claims, id, &query).await?;
    Ok(Json(days))
}

/// Change the daily capacity
#[utoipa::path(
    put,
    path = "/host/places/{id}/capacity",
    tag = "host",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Place ID")),
    request_body = UpdateCapacity,
    responses(
        (status = 200, description = "Capacity changed", body = Place),
        (status = 422, description = "Below passes already booked")
    )
)]
pub async fn update_capacity(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCapacity>,
) -> AppResult<Json<Place>> {
    let place = state.services.places.update_capacity(&claims, id, request).await?;
    Ok(Json(place))
}

/// Assign security staff
#[utoipa::path(
    put,
    path = "/host/places/{id}/security",
    tag = "host",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Place ID")),
    request_body = AssignSecurity,
    responses(
        (status = 200, description = "Staff assigned", body = Place),
        (status = 400, description = "Unknown or non-security user")
    )
)]
pub async fn assign_security(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignSecurity>,
) -> AppResult<Json<Place>> {
    let place = state.services.places.assign_security(&claims, id, request).await?;
    Ok(Json(place))
}

/// Bookings for a place
#[utoipa::path(
    get,
    path = "/host/places/{id}/bookings",
    tag = "host",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Place ID"),
        BookingQuery
    ),
    responses(
        (status = 200, description = "Bookings", body = Vec<Booking>),
        (status = 403, description = "Not the owner")
    )
)]
pub async fn place_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state.services.places.bookings(&claims, id, &query).await?;
    Ok(Json(bookings))
}
