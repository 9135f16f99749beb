//! Reservation (borrow event) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::actor::ActorSummary;
use super::book::BookSummary;

/// Reservation row from the ledger
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i32,
    pub actor_id: i32,
    pub book_id: i32,
    pub reserved_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Outstanding,
    Returned,
}

impl Reservation {
    pub fn status(&self) -> ReservationStatus {
        if self.returned_at.is_some() {
            ReservationStatus::Returned
        } else {
            ReservationStatus::Outstanding
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.status() == ReservationStatus::Outstanding
    }
}

/// Reservation with denormalized book and actor snapshots for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationDetails {
    pub id: i32,
    pub reserved_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: ReservationStatus,
    pub book: BookSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorSummary>,
}

/// Create reservation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReservation {
    #[validate(range(min = 1, message = "Book id must be positive"))]
    pub book_id: i32,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[validate(length(min = 1, message = "Due date is required"))]
    pub due_date: String,
}

/// Return reservation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnReservation {
    #[validate(range(min = 1, message = "Reservation id must be positive"))]
    pub reservation_id: i32,
}
