//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::actor::{Actor, ActorSummary, RegisterActor},
    AppState,
};

/// Login request
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token issued on registration or login
#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub user: ActorSummary,
}

impl AuthResponse {
    fn bearer(token: String, actor: &Actor) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            user: ActorSummary::from(actor),
        }
    }
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterActor,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterActor>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;

    let (token, actor) = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::bearer(token, &actor))))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    request.validate()?;

    let (token, actor) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(AuthResponse::bearer(token, &actor)))
}
