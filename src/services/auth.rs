//! Authentication service: registration, login and token verification

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::actor::{Actor, ActorClaims, NewActor, RegisterActor},
    repository::Store,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash
pub fn verify_password(actor: &Actor, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(&actor.password)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Register a new actor with no capabilities and return a token for it
    pub async fn register(&self, request: RegisterActor) -> AppResult<(String, Actor)> {
        if self.store.actors_get_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let actor = self
            .store
            .actors_create(&NewActor {
                email: request.email,
                name: request.name,
                password_hash: hash_password(&request.password)?,
            })
            .await?;

        tracing::info!("Registered actor id={}", actor.id);

        let token = self.create_token(&actor)?;
        Ok((token, actor))
    }

    /// Authenticate by email and password and return a JWT
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, Actor)> {
        let actor = self
            .store
            .actors_get_by_email(email)
            .await?
            .filter(|a| a.is_active)
            .ok_or_else(|| {
                AppError::Authentication("Invalid credentials or inactive account".to_string())
            })?;

        if !verify_password(&actor, password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = self.create_token(&actor)?;
        Ok((token, actor))
    }

    /// Resolve a bearer token to its actor. Inactive actors are rejected on
    /// every call, so deactivation takes effect before the token expires.
    pub async fn verify_token(&self, token: &str) -> AppResult<Actor> {
        let claims = ActorClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

        match self.store.actors_get_by_id(claims.actor_id).await {
            Ok(actor) if actor.is_active => Ok(actor),
            Ok(_) | Err(AppError::NotFound(_)) => Err(AppError::Authentication(
                "User not found or inactive".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    fn create_token(&self, actor: &Actor) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = ActorClaims {
            sub: actor.email.clone(),
            actor_id: actor.id,
            name: actor.name.clone(),
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryRepository;

    fn service() -> (AuthService, Arc<MemoryRepository>) {
        let store = Arc::new(MemoryRepository::new());
        let service = AuthService::new(store.clone(), AuthConfig::default());
        (service, store)
    }

    fn registration(email: &str) -> RegisterActor {
        RegisterActor {
            email: email.to_string(),
            name: "Ada Reader".to_string(),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_actor_without_capabilities() {
        let (service, store) = service();

        let (token, actor) = service.register(registration("ada@example.org")).await.unwrap();

        assert!(!token.is_empty());
        assert!(actor.is_active);
        assert_ne!(actor.password, "correct horse");
        let permissions = store.permissions_get(actor.id).await.unwrap();
        assert_eq!(permissions, Some(Default::default()));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let (service, _) = service();
        service.register(registration("ada@example.org")).await.unwrap();

        let result = service.register(registration("ADA@example.org")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_and_verify() {
        let (service, _) = service();
        let (_, registered) = service.register(registration("ada@example.org")).await.unwrap();

        let (token, _) = service.login("ada@example.org", "correct horse").await.unwrap();
        let actor = service.verify_token(&token).await.unwrap();
        assert_eq!(actor.id, registered.id);

        let wrong = service.login("ada@example.org", "wrong horse").await;
        assert!(matches!(wrong, Err(AppError::Authentication(_))));
        let unknown = service.login("bob@example.org", "correct horse").await;
        assert!(matches!(unknown, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_deactivated_actor_token_rejected() {
        let (service, store) = service();
        let (token, actor) = service.register(registration("ada@example.org")).await.unwrap();

        store.actors_deactivate(actor.id).await.unwrap();

        let result = service.verify_token(&token).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
        let login = service.login("ada@example.org", "correct horse").await;
        assert!(matches!(login, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let (service, _) = service();
        let result = service.verify_token("not-a-jwt").await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }
}
