//! Business logic services

pub mod auth;
pub mod authz;
pub mod catalog;
pub mod reservations;
pub mod users;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, ReservationsConfig},
    error::AppResult,
    repository::Store,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub authz: authz::AuthorizationGate,
    pub catalog: catalog::CatalogService,
    pub reservations: reservations::ReservationsService,
    pub users: users::UsersService,
    store: Arc<dyn Store>,
}

impl Services {
    /// Create all services over the given store
    pub fn new(
        store: Arc<dyn Store>,
        auth_config: AuthConfig,
        reservations_config: ReservationsConfig,
    ) -> Self {
        let authz = authz::AuthorizationGate::new(store.clone());
        Self {
            auth: auth::AuthService::new(store.clone(), auth_config),
            catalog: catalog::CatalogService::new(store.clone(), authz.clone()),
            reservations: reservations::ReservationsService::new(store.clone(), reservations_config),
            users: users::UsersService::new(store.clone(), authz.clone()),
            authz,
            store,
        }
    }

    /// Check that the store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
