//! Catalog management service

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        actor::{Actor, ActorSummary, Capability},
        book::{
            Book, BookChanges, BookDetails, BookFilter, BookQuery, BookReservationEntry,
            CreateBook, NewBook, UpdateBook,
        },
        parse_timestamp,
    },
    repository::Store,
};

use super::authz::AuthorizationGate;

fn parse_date(field: &str, value: &str) -> AppResult<DateTime<Utc>> {
    parse_timestamp(value)
        .ok_or_else(|| AppError::Validation(format!("Invalid date format for {}", field)))
}

fn parse_optional_date(field: &str, value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(field, v))
        .transpose()
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    authz: AuthorizationGate,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, authz: AuthorizationGate) -> Self {
        Self { store, authz }
    }

    /// Search books with filters
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let filter = BookFilter {
            title: query.title.clone(),
            author: query.author.clone(),
            genre: query.genre.clone(),
            publisher: query.publisher.clone(),
            published_before: parse_optional_date(
                "published_before",
                query.published_before.as_deref(),
            )?,
            published_after: parse_optional_date(
                "published_after",
                query.published_after.as_deref(),
            )?,
            available_only: query.available.unwrap_or(false),
            include_inactive: query.include_inactive.unwrap_or(false),
        };

        self.store.books_search(&filter).await
    }

    /// Active book with its reservations, newest first
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.store.books_get_by_id(id).await?;
        if !book.is_active {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let reservations = self.store.reservations_list_by_book(id).await?;

        let mut actor_ids: Vec<i32> = reservations.iter().map(|r| r.actor_id).collect();
        actor_ids.sort_unstable();
        actor_ids.dedup();
        let actors: HashMap<i32, ActorSummary> = self
            .store
            .actors_get_many(&actor_ids)
            .await?
            .iter()
            .map(|a| (a.id, ActorSummary::from(a)))
            .collect();

        let reservations = reservations
            .into_iter()
            .map(|r| BookReservationEntry {
                id: r.id,
                reserved_at: r.reserved_at,
                due_at: r.due_at,
                returned_at: r.returned_at,
                actor: actors.get(&r.actor_id).cloned(),
            })
            .collect();

        Ok(BookDetails { book, reservations })
    }

    /// Create a new book (`CreateItems`)
    pub async fn create_book(&self, actor: &Actor, request: CreateBook) -> AppResult<Book> {
        self.authz
            .require(actor, Capability::CreateItems, None)
            .await?;

        let book = NewBook {
            published_date: parse_date("published_date", &request.published_date)?,
            title: request.title,
            author: request.author,
            genre: request.genre,
            publisher: request.publisher,
            available_copies: request.available_copies.unwrap_or(1),
        };
        if book.available_copies < 1 {
            return Err(AppError::Validation(
                "Available copies must be positive".to_string(),
            ));
        }

        let created = self.store.books_create(&book).await?;

        tracing::info!(
            "Actor {} created book id={} with {} copies",
            actor.id,
            created.id,
            created.available_copies
        );
        Ok(created)
    }

    /// Apply the supplied fields only (`UpdateItems`)
    pub async fn update_book(&self, actor: &Actor, id: i32, request: UpdateBook) -> AppResult<Book> {
        self.authz
            .require(actor, Capability::UpdateItems, None)
            .await?;

        let changes = BookChanges {
            published_date: parse_optional_date("published_date", request.published_date.as_deref())?,
            title: request.title,
            author: request.author,
            genre: request.genre,
            publisher: request.publisher,
            available_copies: request.available_copies,
        };
        if changes.available_copies.map_or(false, |c| c < 1) {
            return Err(AppError::Validation(
                "Available copies must be positive".to_string(),
            ));
        }

        let updated = self.store.books_update(id, &changes).await?;

        tracing::info!("Actor {} updated book id={}", actor.id, id);
        Ok(updated)
    }

    /// One-way soft delete (`DeleteItems`)
    pub async fn deactivate_book(&self, actor: &Actor, id: i32) -> AppResult<Book> {
        self.authz
            .require(actor, Capability::DeleteItems, None)
            .await?;

        let book = self.store.books_deactivate(id).await?;

        tracing::info!("Actor {} deactivated book id={}", actor.id, id);
        Ok(book)
    }
}
