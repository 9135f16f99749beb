//! Process-local store.
//!
//! All tables sit behind one async mutex; each trait method holds it for its
//! whole body, which makes every call a serializable transaction within this
//! process. Used by the test suites and by `database.backend = "memory"`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{
        actor::{Actor, ActorChanges, NewActor, PermissionSet},
        book::{Book, BookChanges, BookFilter, NewBook},
        reservation::Reservation,
    },
};

use super::Store;

#[derive(Default)]
struct Tables {
    actors: HashMap<i32, Actor>,
    permissions: HashMap<i32, PermissionSet>,
    books: HashMap<i32, Book>,
    reservations: HashMap<i32, Reservation>,
    next_actor_id: i32,
    next_book_id: i32,
    next_reservation_id: i32,
}

impl Tables {
    fn book_mut(&mut self, id: i32) -> AppResult<&mut Book> {
        self.books
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    fn actor_mut(&mut self, id: i32) -> AppResult<&mut Actor> {
        self.actors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }
}

/// Newest reservation first; ids break ties between equal timestamps
fn sort_newest_first(reservations: &mut [Reservation]) {
    reservations.sort_by(|a, b| {
        b.reserved_at
            .cmp(&a.reserved_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[derive(Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn actors_create(&self, actor: &NewActor) -> AppResult<Actor> {
        let mut tables = self.tables.lock().await;

        let email = actor.email.to_lowercase();
        if tables.actors.values().any(|a| a.email.to_lowercase() == email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        tables.next_actor_id += 1;
        let now = Utc::now();
        let created = Actor {
            id: tables.next_actor_id,
            email: actor.email.clone(),
            name: actor.name.clone(),
            password: actor.password_hash.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.actors.insert(created.id, created.clone());
        tables.permissions.insert(created.id, PermissionSet::default());

        Ok(created)
    }

    async fn actors_get_by_id(&self, id: i32) -> AppResult<Actor> {
        let mut tables = self.tables.lock().await;
        tables.actor_mut(id).map(|a| a.clone())
    }

    async fn actors_get_by_email(&self, email: &str) -> AppResult<Option<Actor>> {
        let tables = self.tables.lock().await;
        let email = email.to_lowercase();
        Ok(tables
            .actors
            .values()
            .find(|a| a.email.to_lowercase() == email)
            .cloned())
    }

    async fn actors_get_many(&self, ids: &[i32]) -> AppResult<Vec<Actor>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.actors.get(id).cloned())
            .collect())
    }

    async fn actors_update(&self, id: i32, changes: &ActorChanges) -> AppResult<Actor> {
        let mut tables = self.tables.lock().await;
        let actor = tables.actor_mut(id)?;
        if let Some(ref name) = changes.name {
            actor.name = name.clone();
        }
        if let Some(ref password_hash) = changes.password_hash {
            actor.password = password_hash.clone();
        }
        actor.updated_at = Utc::now();
        Ok(actor.clone())
    }

    async fn actors_deactivate(&self, id: i32) -> AppResult<Actor> {
        let mut tables = self.tables.lock().await;
        let actor = tables.actor_mut(id)?;
        actor.is_active = false;
        actor.updated_at = Utc::now();
        Ok(actor.clone())
    }

    async fn permissions_get(&self, actor_id: i32) -> AppResult<Option<PermissionSet>> {
        let tables = self.tables.lock().await;
        Ok(tables.permissions.get(&actor_id).copied())
    }

    async fn permissions_update(
        &self,
        actor_id: i32,
        permissions: &PermissionSet,
    ) -> AppResult<PermissionSet> {
        let mut tables = self.tables.lock().await;
        let current = tables
            .permissions
            .get_mut(&actor_id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", actor_id)))?;
        *current = *permissions;
        Ok(*current)
    }

    async fn books_create(&self, book: &NewBook) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        tables.next_book_id += 1;
        let now = Utc::now();
        let created = Book {
            id: tables.next_book_id,
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            publisher: book.publisher.clone(),
            published_date: book.published_date,
            available_copies: book.available_copies,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(created.id, created.clone());
        Ok(created)
    }

    async fn books_get_by_id(&self, id: i32) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        tables.book_mut(id).map(|b| b.clone())
    }

    async fn books_get_many(&self, ids: &[i32]) -> AppResult<Vec<Book>> {
        let tables = self.tables.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.books.get(id).cloned())
            .collect())
    }

    async fn books_search(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let tables = self.tables.lock().await;
        let mut books: Vec<Book> = tables
            .books
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn books_update(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        let book = tables.book_mut(id)?;
        if let Some(ref title) = changes.title {
            book.title = title.clone();
        }
        if let Some(ref author) = changes.author {
            book.author = author.clone();
        }
        if let Some(ref genre) = changes.genre {
            book.genre = genre.clone();
        }
        if let Some(ref publisher) = changes.publisher {
            book.publisher = publisher.clone();
        }
        if let Some(published_date) = changes.published_date {
            book.published_date = published_date;
        }
        if let Some(available_copies) = changes.available_copies {
            book.available_copies = available_copies;
        }
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn books_deactivate(&self, id: i32) -> AppResult<Book> {
        let mut tables = self.tables.lock().await;
        let book = tables.book_mut(id)?;
        book.is_active = false;
        book.updated_at = Utc::now();
        Ok(book.clone())
    }

    async fn reservations_create(
        &self,
        actor_id: i32,
        book_id: i32,
        reserved_at: DateTime<Utc>,
        due_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)> {
        let mut tables = self.tables.lock().await;

        let book = tables
            .books
            .get_mut(&book_id)
            .filter(|b| b.is_active)
            .ok_or_else(|| AppError::NotFound("Book not found or inactive".to_string()))?;
        if book.available_copies <= 0 {
            return Err(AppError::Unavailable(
                "No available copies of this book".to_string(),
            ));
        }
        book.available_copies -= 1;
        book.updated_at = reserved_at;
        let book = book.clone();

        tables.next_reservation_id += 1;
        let reservation = Reservation {
            id: tables.next_reservation_id,
            actor_id,
            book_id,
            reserved_at,
            due_at,
            returned_at: None,
            is_active: true,
        };
        tables.reservations.insert(reservation.id, reservation.clone());

        Ok((reservation, book))
    }

    async fn reservations_return(
        &self,
        actor_id: i32,
        reservation_id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<(Reservation, Book)> {
        let mut tables = self.tables.lock().await;

        let reservation = tables
            .reservations
            .get(&reservation_id)
            .filter(|r| r.actor_id == actor_id && r.is_outstanding())
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound("Reservation not found or already returned".to_string())
            })?;

        // Resolve the book before mutating anything so a dangling reference
        // leaves both tables untouched
        let book = tables.book_mut(reservation.book_id)?;
        book.available_copies += 1;
        book.updated_at = returned_at;
        let book = book.clone();

        let stored = tables
            .reservations
            .get_mut(&reservation_id)
            .ok_or_else(|| AppError::Internal("Reservation vanished mid-return".to_string()))?;
        stored.returned_at = Some(returned_at);

        Ok((stored.clone(), book))
    }

    async fn reservations_list_by_actor(
        &self,
        actor_id: i32,
        outstanding_only: bool,
    ) -> AppResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.actor_id == actor_id)
            .filter(|r| !outstanding_only || (r.is_outstanding() && r.is_active))
            .cloned()
            .collect();
        sort_newest_first(&mut reservations);
        Ok(reservations)
    }

    async fn reservations_list_by_book(&self, book_id: i32) -> AppResult<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        let mut reservations: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        sort_newest_first(&mut reservations);
        Ok(reservations)
    }
}
