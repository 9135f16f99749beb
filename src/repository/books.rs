//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookChanges, BookFilter, NewBook},
};

pub(super) const BOOK_COLUMNS: &str = "id, title, author, genre, publisher, published_date, \
                            available_copies, is_active, created_at, updated_at";

/// Escape LIKE wildcards so user input matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Get book by ID, active or not
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn get_many(&self, ids: &[i32]) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = ANY($1)",
            BOOK_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Search books with filters, ordered by title
    pub async fn search(&self, filter: &BookFilter) -> AppResult<Vec<Book>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM books WHERE 1=1",
            BOOK_COLUMNS
        ));

        if !filter.include_inactive {
            query.push(" AND is_active");
        }

        for (column, term) in [
            ("title", &filter.title),
            ("author", &filter.author),
            ("genre", &filter.genre),
            ("publisher", &filter.publisher),
        ] {
            if let Some(term) = term {
                query
                    .push(format!(" AND LOWER({}) LIKE ", column))
                    .push_bind(like_pattern(term));
            }
        }

        if let Some(before) = filter.published_before {
            query.push(" AND published_date <= ").push_bind(before);
        }

        if let Some(after) = filter.published_after {
            query.push(" AND published_date >= ").push_bind(after);
        }

        if filter.available_only {
            query.push(" AND available_copies > 0");
        }

        query.push(" ORDER BY title ASC, id ASC");

        let books = query.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok(books)
    }

    // =========================================================================
    // WRITE
    // =========================================================================

    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let now = Utc::now();

        let created = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (
                title, author, genre, publisher, published_date,
                available_copies, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(&book.publisher)
        .bind(book.published_date)
        .bind(book.available_copies)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Partial update: NULL parameters keep the current value
    pub async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = COALESCE($1, title),
                author = COALESCE($2, author),
                genre = COALESCE($3, genre),
                publisher = COALESCE($4, publisher),
                published_date = COALESCE($5, published_date),
                available_copies = COALESCE($6, available_copies),
                updated_at = $7
            WHERE id = $8
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(changes.title.as_deref())
        .bind(changes.author.as_deref())
        .bind(changes.genre.as_deref())
        .bind(changes.publisher.as_deref())
        .bind(changes.published_date)
        .bind(changes.available_copies)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Soft delete (clears is_active)
    pub async fn deactivate(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET is_active = FALSE, updated_at = $1 WHERE id = $2 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }
}
