//! Actor management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::actor::{Actor, ActorChanges, ActorProfile, Capability, PermissionSet, UpdateActor},
    repository::Store,
};

use super::{auth::hash_password, authz::AuthorizationGate};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn Store>,
    authz: AuthorizationGate,
}

impl UsersService {
    pub fn new(store: Arc<dyn Store>, authz: AuthorizationGate) -> Self {
        Self { store, authz }
    }

    /// The caller's own record with its permission set
    pub async fn profile(&self, actor: &Actor) -> AppResult<ActorProfile> {
        let actor = self.store.actors_get_by_id(actor.id).await?;
        let permissions = self
            .store
            .permissions_get(actor.id)
            .await?
            .unwrap_or_default();
        Ok(ActorProfile::new(actor, permissions))
    }

    /// Update name and/or password of `target_id` (self or `UpdateActors`)
    pub async fn update_actor(
        &self,
        actor: &Actor,
        target_id: i32,
        update: UpdateActor,
    ) -> AppResult<Actor> {
        self.authz
            .require(actor, Capability::UpdateActors, Some(target_id))
            .await?;

        // Existence check after authorization, so unprivileged callers cannot enumerate ids
        self.store.actors_get_by_id(target_id).await?;

        let password_hash = match update.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        let updated = self
            .store
            .actors_update(
                target_id,
                &ActorChanges {
                    name: update.name,
                    password_hash,
                },
            )
            .await?;

        tracing::info!("Actor {} updated actor {}", actor.id, target_id);
        Ok(updated)
    }

    /// Soft delete `target_id` (self or `DeleteActors`)
    pub async fn deactivate_actor(&self, actor: &Actor, target_id: i32) -> AppResult<Actor> {
        self.authz
            .require(actor, Capability::DeleteActors, Some(target_id))
            .await?;

        let deactivated = self.store.actors_deactivate(target_id).await?;

        tracing::info!("Actor {} deactivated actor {}", actor.id, target_id);
        Ok(deactivated)
    }

    /// Replace the permission set of `target_id`. Requires `UpdateActors`
    /// even for the caller's own record.
    pub async fn update_permissions(
        &self,
        actor: &Actor,
        target_id: i32,
        permissions: PermissionSet,
    ) -> AppResult<PermissionSet> {
        self.authz
            .require(actor, Capability::UpdateActors, None)
            .await?;

        let target = self.store.actors_get_by_id(target_id).await?;
        if !target.is_active {
            return Err(AppError::NotFound(format!("User with id {} not found", target_id)));
        }

        let updated = self.store.permissions_update(target_id, &permissions).await?;

        tracing::info!("Actor {} changed permissions of actor {}", actor.id, target_id);
        Ok(updated)
    }
}
