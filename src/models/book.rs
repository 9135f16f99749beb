//! Book (catalog item) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::actor::ActorSummary;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub published_date: DateTime<Utc>,
    pub available_copies: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal book projection joined into reservation listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub published_date: DateTime<Utc>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            publisher: book.publisher.clone(),
            published_date: book.published_date,
        }
    }
}

/// Reservation entry shown on a book's detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookReservationEntry {
    pub id: i32,
    pub reserved_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub actor: Option<ActorSummary>,
}

/// Book with its reservation history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub reservations: Vec<BookReservationEntry>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: String,
    /// RFC 3339 timestamp or YYYY-MM-DD
    #[validate(length(min = 1, message = "Published date is required"))]
    pub published_date: String,
    #[validate(length(min = 1, message = "Publisher is required"))]
    pub publisher: String,
    /// Defaults to 1
    #[validate(range(min = 1, message = "Available copies must be positive"))]
    pub available_copies: Option<i32>,
}

/// Update book request. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: Option<String>,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: Option<String>,
    pub published_date: Option<String>,
    #[validate(length(min = 1, message = "Publisher is required"))]
    pub publisher: Option<String>,
    #[validate(range(min = 1, message = "Available copies must be positive"))]
    pub available_copies: Option<i32>,
}

/// Book search parameters (API)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    /// Inclusive upper bound on published_date
    pub published_before: Option<String>,
    /// Inclusive lower bound on published_date
    pub published_after: Option<String>,
    /// Only books with at least one available copy
    pub available: Option<bool>,
    pub include_inactive: Option<bool>,
}

/// Insert payload for a new book
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub published_date: DateTime<Utc>,
    pub available_copies: i32,
}

/// Parsed partial update
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub available_copies: Option<i32>,
}

/// Parsed search filter handed to the store
#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub published_before: Option<DateTime<Utc>>,
    pub published_after: Option<DateTime<Utc>>,
    pub available_only: bool,
    pub include_inactive: bool,
}

impl BookFilter {
    /// Evaluate the filter against a single book
    pub fn matches(&self, book: &Book) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
                .unwrap_or(true)
        }

        (self.include_inactive || book.is_active)
            && contains(&book.title, &self.title)
            && contains(&book.author, &self.author)
            && contains(&book.genre, &self.genre)
            && contains(&book.publisher, &self.publisher)
            && self.published_before.map_or(true, |d| book.published_date <= d)
            && self.published_after.map_or(true, |d| book.published_date >= d)
            && (!self.available_only || book.available_copies > 0)
    }
}
