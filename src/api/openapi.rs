//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health, reservations, users};

/// Registers the JWT bearer scheme referenced by `security(("bearer_auth" = []))`
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfwise API",
        version = "1.0.0",
        description = "Library book reservation REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        // Users
        users::get_profile,
        users::update_user,
        users::delete_user,
        users::update_permissions,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Reservations
        reservations::create_reservation,
        reservations::return_reservation,
        reservations::get_active,
        reservations::get_history,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::AuthResponse,
            crate::models::actor::RegisterActor,
            // Users
            crate::models::actor::Actor,
            crate::models::actor::ActorProfile,
            crate::models::actor::ActorSummary,
            crate::models::actor::PermissionSet,
            crate::models::actor::Capability,
            crate::models::actor::UpdateActor,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetails,
            crate::models::book::BookReservationEntry,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Reservations
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::ReturnReservation,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Account and permission management"),
        (name = "books", description = "Catalog management"),
        (name = "reservations", description = "Reserve and return copies")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
