//! Repository layer for database operations

pub mod actors;
pub mod books;
pub mod memory;
pub mod reservations;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        actor::{Actor, ActorChanges, NewActor, PermissionSet},
        book::{Book, BookChanges, BookFilter, NewBook},
        reservation::Reservation,
    },
};

/// Persistence contract consumed by the services.
///
/// Every method is a single bounded unit of work. `reservations_create` and
/// `reservations_return` must apply the ledger write and the copy-count
/// change atomically, and the decrement must be conditional on a positive
/// count at the storage layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> AppResult<()>;

    // Actors and permissions
    /// Insert an actor together with an all-false permission set
    async fn actors_create(&self, actor: &NewActor) -> AppResult<Actor>;
    async fn actors_get_by_id(&self, id: i32) -> AppResult<Actor>;
    async fn actors_get_by_email(&self, email: &str) -> AppResult<Option<Actor>>;
    async fn actors_get_many(&self, ids: &[i32]) -> AppResult<Vec<Actor>>;
    async fn actors_update(&self, id: i32, changes: &ActorChanges) -> AppResult<Actor>;
    async fn actors_deactivate(&self, id: i32) -> AppResult<Actor>;
    async fn permissions_get(&self, actor_id: i32) -> AppResult<Option<PermissionSet>>;
    async fn permissions_update(
        &self,
        actor_id: i32,
        permissions: &PermissionSet,
    ) -> AppResult<PermissionSet>;

    // Catalog
    async fn books_create(&self, book: &NewBook) -> AppResult<Book>;
    /// Fetch a book regardless of its active flag
    async fn books_get_by_id(&self, id: i32) -> AppResult<Book>;
    async fn books_get_many(&self, ids: &[i32]) -> AppResult<Vec<Book>>;
    async fn books_search(&self, filter: &BookFilter) -> AppResult<Vec<Book>>;
    async fn books_update(&self, id: i32, changes: &BookChanges) -> AppResult<Book>;
    async fn books_deactivate(&self, id: i32) -> AppResult<Book>;

    // Reservation ledger
    /// Decrement-if-positive on an active book plus ledger insert, as one unit.
    /// `NotFound` for a missing or inactive book, `Unavailable` when no copy is left.
    /// The book is returned as it stands after the decrement.
    async fn reservations_create(
        &self,
        actor_id: i32,
        book_id: i32,
        reserved_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)>;
    /// Mark an outstanding reservation owned by `actor_id` returned and give the
    /// copy back, as one unit. `NotFound` otherwise. The book is returned as it
    /// stands after the increment.
    async fn reservations_return(
        &self,
        actor_id: i32,
        reservation_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)>;
    /// Reservations of an actor, most recently reserved first
    async fn reservations_list_by_actor(
        &self,
        actor_id: i32,
        outstanding_only: bool,
    ) -> AppResult<Vec<Reservation>>;
    async fn reservations_list_by_book(&self, book_id: i32) -> AppResult<Vec<Reservation>>;
}

/// Postgres-backed store holding the connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub actors: actors::ActorsRepository,
    pub books: books::BooksRepository,
    pub reservations: reservations::ReservationsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            actors: actors::ActorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl Store for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn actors_create(&self, actor: &NewActor) -> AppResult<Actor> {
        self.actors.create(actor).await
    }

    async fn actors_get_by_id(&self, id: i32) -> AppResult<Actor> {
        self.actors.get_by_id(id).await
    }

    async fn actors_get_by_email(&self, email: &str) -> AppResult<Option<Actor>> {
        self.actors.get_by_email(email).await
    }

    async fn actors_get_many(&self, ids: &[i32]) -> AppResult<Vec<Actor>> {
        self.actors.get_many(ids).await
    }

    async fn actors_update(&self, id: i32, changes: &ActorChanges) -> AppResult<Actor> {
        self.actors.update(id, changes).await
    }

    async fn actors_deactivate(&self, id: i32) -> AppResult<Actor> {
        self.actors.deactivate(id).await
    }

    async fn permissions_get(&self, actor_id: i32) -> AppResult<Option<PermissionSet>> {
        self.actors.get_permissions(actor_id).await
    }

    async fn permissions_update(
        &self,
        actor_id: i32,
        permissions: &PermissionSet,
    ) -> AppResult<PermissionSet> {
        self.actors.update_permissions(actor_id, permissions).await
    }

    async fn books_create(&self, book: &NewBook) -> AppResult<Book> {
        self.books.create(book).await
    }

    async fn books_get_by_id(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    async fn books_get_many(&self, ids: &[i32]) -> AppResult<Vec<Book>> {
        self.books.get_many(ids).await
    }

    async fn books_search(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        self.books.search(filter).await
    }

    async fn books_update(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        self.books.update(id, changes).await
    }

    async fn books_deactivate(&self, id: i32) -> AppResult<Book> {
        self.books.deactivate(id).await
    }

    async fn reservations_create(
        &self,
        actor_id: i32,
        book_id: i32,
        reserved_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)> {
        self.reservations
            .create(actor_id, book_id, reserved_at, due_at)
            .await
    }

    async fn reservations_return(
        &self,
        actor_id: i32,
        reservation_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)> {
        self.reservations
            .return_reservation(actor_id, reservation_id, returned_at)
            .await
    }

    async fn reservations_list_by_actor(
        &self,
        actor_id: i32,
        outstanding_only: bool,
    ) -> AppResult<Vec<Reservation>> {
        self.reservations.list_by_actor(actor_id, outstanding_only).await
    }

    async fn reservations_list_by_book(&self, book_id: i32) -> AppResult<Vec<Reservation>> {
        self.reservations.list_by_book(book_id).await
    }
}
