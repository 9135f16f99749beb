//! API handlers for the Shelfwise REST endpoints

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod reservations;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::actor::Actor, AppState};

/// Extractor for the authenticated actor behind a bearer token.
///
/// The token is checked against the store on every request, so a deactivated
/// actor is rejected even while its token is still valid.
pub struct AuthenticatedUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let actor = state.services.auth.verify_token(token).await?;
        Ok(AuthenticatedUser(actor))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // Users
        .route("/users/profile", get(users::get_profile))
        .route("/users/reservations/history", get(reservations::get_history))
        .route("/users/:id", put(users::update_user).delete(users::delete_user))
        .route("/users/:id/permissions", put(users::update_permissions))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Reservations
        .route("/reservations", post(reservations::create_reservation))
        .route("/reservations/return", post(reservations::return_reservation))
        .route("/reservations/active", get(reservations::get_active))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
