//! Reservation engine: atomic reserve and return against the catalog counters

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use crate::{
    config::ReservationsConfig,
    error::{AppError, AppResult},
    models::{
        actor::{Actor, ActorSummary},
        book::BookSummary,
        parse_timestamp,
        reservation::{Reservation, ReservationDetails},
    },
    repository::Store,
};

fn details(
    reservation: Reservation,
    book: BookSummary,
    actor: Option<ActorSummary>,
) -> ReservationDetails {
    ReservationDetails {
        id: reservation.id,
        status: reservation.status(),
        reserved_at: reservation.reserved_at,
        due_at: reservation.due_at,
        returned_at: reservation.returned_at,
        book,
        actor,
    }
}

#[derive(Clone)]
pub struct ReservationsService {
    store: Arc<dyn Store>,
    config: ReservationsConfig,
}

impl ReservationsService {
    pub fn new(store: Arc<dyn Store>, config: ReservationsConfig) -> Self {
        Self { store, config }
    }

    /// Reserve one copy of `book_id` for the actor
    pub async fn create_reservation(
        &self,
        actor: &Actor,
        book_id: i32,
        due_date: &str,
    ) -> AppResult<ReservationDetails> {
        if !actor.is_active {
            return Err(AppError::Authentication("User not found or inactive".to_string()));
        }

        let due_at = parse_timestamp(due_date)
            .ok_or_else(|| AppError::Validation("Invalid date format for due_date".to_string()))?;

        let now = Utc::now();
        if self.config.enforce_future_due_date && due_at <= now {
            return Err(AppError::Validation(
                "Due date must be after the reservation date".to_string(),
            ));
        }

        let (reservation, book) = self
            .store
            .reservations_create(actor.id, book_id, now, due_at)
            .await?;

        tracing::info!(
            "Actor {} reserved book id={} (reservation {}), {} copies left",
            actor.id,
            book_id,
            reservation.id,
            book.available_copies
        );

        Ok(details(
            reservation,
            BookSummary::from(&book),
            Some(ActorSummary::from(actor)),
        ))
    }

    /// Return an outstanding reservation owned by the actor
    pub async fn return_reservation(
        &self,
        actor: &Actor,
        reservation_id: i32,
    ) -> AppResult<ReservationDetails> {
        if !actor.is_active {
            return Err(AppError::Authentication("User not found or inactive".to_string()));
        }

        let (reservation, book) = self
            .store
            .reservations_return(actor.id, reservation_id, Utc::now())
            .await?;

        tracing::info!(
            "Actor {} returned reservation {} for book id={}, {} copies left",
            actor.id,
            reservation_id,
            book.id,
            book.available_copies
        );

        Ok(details(
            reservation,
            BookSummary::from(&book),
            Some(ActorSummary::from(actor)),
        ))
    }

    /// Outstanding reservations of the actor, newest first
    pub async fn list_active(&self, actor: &Actor) -> AppResult<Vec<ReservationDetails>> {
        let reservations = self.store.reservations_list_by_actor(actor.id, true).await?;
        self.with_books(reservations).await
    }

    /// Every reservation the actor ever made, newest first
    pub async fn history(&self, actor: &Actor) -> AppResult<Vec<ReservationDetails>> {
        let reservations = self.store.reservations_list_by_actor(actor.id, false).await?;
        self.with_books(reservations).await
    }

    async fn with_books(
        &self,
        reservations: Vec<Reservation>,
    ) -> AppResult<Vec<ReservationDetails>> {
        let mut book_ids: Vec<i32> = reservations.iter().map(|r| r.book_id).collect();
        book_ids.sort_unstable();
        book_ids.dedup();

        let books: HashMap<i32, BookSummary> = self
            .store
            .books_get_many(&book_ids)
            .await?
            .iter()
            .map(|b| (b.id, BookSummary::from(b)))
            .collect();

        reservations
            .into_iter()
            .map(|r| {
                let book = books.get(&r.book_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!(
                        "Reservation {} references missing book {}",
                        r.id, r.book_id
                    ))
                })?;
                Ok(details(r, book, None))
            })
            .collect()
    }
}
