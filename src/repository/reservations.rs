//! Reservations repository: the ledger and its copy accounting

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{book::Book, reservation::Reservation},
};

use super::books::BOOK_COLUMNS;

const RESERVATION_COLUMNS: &str =
    "id, actor_id, book_id, reserved_at, due_at, returned_at, is_active";

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Reserve one copy of a book.
    ///
    /// The conditional decrement takes the row lock on the book, so concurrent
    /// callers racing for the last copy serialize here and all but one see
    /// zero updated rows.
    pub async fn create(
        &self,
        actor_id: i32,
        book_id: i32,
        reserved_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)> {
        let mut tx = self.pool.begin().await?;

        let decremented = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET available_copies = available_copies - 1, updated_at = $2
            WHERE id = $1 AND is_active AND available_copies > 0
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(book_id)
        .bind(reserved_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book) = decremented else {
            let is_active: Option<bool> =
                sqlx::query_scalar("SELECT is_active FROM books WHERE id = $1")
                    .bind(book_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            // Dropping the transaction rolls it back
            return match is_active {
                Some(true) => Err(AppError::Unavailable(
                    "No available copies of this book".to_string(),
                )),
                _ => Err(AppError::NotFound("Book not found or inactive".to_string())),
            };
        };

        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            INSERT INTO reservations (actor_id, book_id, reserved_at, due_at, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(actor_id)
        .bind(book_id)
        .bind(reserved_at)
        .bind(due_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((reservation, book))
    }

    /// Close an outstanding reservation and give its copy back
    pub async fn return_reservation(
        &self,
        actor_id: i32,
        reservation_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            UPDATE reservations
            SET returned_at = $3
            WHERE id = $1 AND actor_id = $2 AND returned_at IS NULL
            RETURNING {}
            "#,
            RESERVATION_COLUMNS
        ))
        .bind(reservation_id)
        .bind(actor_id)
        .bind(returned_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Reservation not found or already returned".to_string())
        })?;

        // Inactive books still get their copy back
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET available_copies = available_copies + 1, updated_at = $2
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(reservation.book_id)
        .bind(returned_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((reservation, book))
    }

    pub async fn list_by_actor(
        &self,
        actor_id: i32,
        outstanding_only: bool,
    ) -> AppResult<Vec<Reservation>> {
        let filter = if outstanding_only {
            "AND returned_at IS NULL AND is_active"
        } else {
            ""
        };

        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            r#"
            SELECT {}
            FROM reservations
            WHERE actor_id = $1 {}
            ORDER BY reserved_at DESC, id DESC
            "#,
            RESERVATION_COLUMNS, filter
        ))
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    pub async fn list_by_book(&self, book_id: i32) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(&format!(
            "SELECT {} FROM reservations WHERE book_id = $1 ORDER BY reserved_at DESC, id DESC",
            RESERVATION_COLUMNS
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }
}
