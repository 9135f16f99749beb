//! Actor management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::actor::{Actor, ActorProfile, PermissionSet, UpdateActor},
    AppState,
};

use super::AuthenticatedUser;

/// Current actor with its permissions
#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own profile", body = ActorProfile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> AppResult<Json<ActorProfile>> {
    let profile = state.services.users.profile(&actor).await?;
    Ok(Json(profile))
}

/// Update name or password (self, or `update_actors`)
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateActor,
    responses(
        (status = 200, description = "User updated", body = Actor),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateActor>,
) -> AppResult<Json<Actor>> {
    request.validate()?;

    let updated = state.services.users.update_actor(&actor, id, request).await?;
    Ok(Json(updated))
}

/// Deactivate an account (self, or `delete_actors`)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.users.deactivate_actor(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a user's permission set (`update_actors` only)
#[utoipa::path(
    put,
    path = "/users/{id}/permissions",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = PermissionSet,
    responses(
        (status = 200, description = "Permissions updated", body = PermissionSet),
        (status = 403, description = "Missing capability"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_permissions(
    State(state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(permissions): Json<PermissionSet>,
) -> AppResult<Json<PermissionSet>> {
    let updated = state
        .services
        .users
        .update_permissions(&actor, id, permissions)
        .await?;
    Ok(Json(updated))
}
