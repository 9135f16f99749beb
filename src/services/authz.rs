//! Authorization gate: decides whether an actor may use a capability

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::actor::{Actor, Capability, PermissionSet},
    repository::Store,
};

/// Pure decision over an actor and its (possibly missing) permission set.
///
/// Acting on one's own actor record is always allowed. Anything else needs
/// the capability; a missing permission set grants nothing.
pub fn authorize(
    actor: &Actor,
    permissions: Option<&PermissionSet>,
    capability: Capability,
    target_actor_id: Option<i32>,
) -> bool {
    if !actor.is_active {
        return false;
    }
    if target_actor_id == Some(actor.id) {
        return true;
    }
    permissions.map_or(false, |p| p.grants(capability))
}

#[derive(Clone)]
pub struct AuthorizationGate {
    store: Arc<dyn Store>,
}

impl AuthorizationGate {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Evaluate against the current permission set. Lookup failures deny.
    pub async fn is_allowed(
        &self,
        actor: &Actor,
        capability: Capability,
        target_actor_id: Option<i32>,
    ) -> bool {
        if target_actor_id == Some(actor.id) {
            return authorize(actor, None, capability, target_actor_id);
        }

        let permissions = match self.store.permissions_get(actor.id).await {
            Ok(permissions) => permissions,
            Err(e) => {
                tracing::warn!(
                    "Permission lookup failed for actor {} ({}), denying: {}",
                    actor.id,
                    capability,
                    e
                );
                None
            }
        };

        authorize(actor, permissions.as_ref(), capability, target_actor_id)
    }

    /// Like [`is_allowed`](Self::is_allowed) but yields `Forbidden` on denial
    pub async fn require(
        &self,
        actor: &Actor,
        capability: Capability,
        target_actor_id: Option<i32>,
    ) -> AppResult<()> {
        if self.is_allowed(actor, capability, target_actor_id).await {
            Ok(())
        } else {
            tracing::warn!("Actor {} denied capability {}", actor.id, capability);
            Err(AppError::Authorization(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}
