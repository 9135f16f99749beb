//! Shelfwise library reservation server
//!
//! A REST JSON API for a lending library: actors with capability sets, a
//! catalog of books with available-copy counters, and a reservation ledger
//! whose create/return operations never oversell a book.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
