//! Reservation endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, ReservationDetails, ReturnReservation},
    AppState,
};

use super::AuthenticatedUser;

/// Reserve a copy of a book
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = ReservationDetails),
        (status = 400, description = "Invalid due date"),
        (status = 404, description = "Book not found or inactive"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<ReservationDetails>)> {
    request.validate()?;

    let reservation = state
        .services
        .reservations
        .create_reservation(&actor, request.book_id, &request.due_date)
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Return a reserved copy
#[utoipa::path(
    post,
    path = "/reservations/return",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = ReturnReservation,
    responses(
        (status = 200, description = "Copy returned", body = ReservationDetails),
        (status = 404, description = "Reservation not found or already returned")
    )
)]
pub async fn return_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(request): Json<ReturnReservation>,
) -> AppResult<Json<ReservationDetails>> {
    request.validate()?;

    let reservation = state
        .services
        .reservations
        .return_reservation(&actor, request.reservation_id)
        .await?;
    Ok(Json(reservation))
}

/// Outstanding reservations of the caller
#[utoipa::path(
    get,
    path = "/reservations/active",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Outstanding reservations, newest first", body = Vec<ReservationDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_active(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.list_active(&actor).await?;
    Ok(Json(reservations))
}

/// Full reservation history of the caller
#[utoipa::path(
    get,
    path = "/users/reservations/history",
    tag = "reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All reservations, newest first", body = Vec<ReservationDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.history(&actor).await?;
    Ok(Json(reservations))
}
