//! Actor model, permission set and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Authenticated identity
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Actor {
    pub id: i32,
    pub email: String,
    pub name: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Named permissions an actor may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    CreateItems,
    UpdateItems,
    DeleteItems,
    UpdateActors,
    DeleteActors,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::CreateItems,
        Capability::UpdateItems,
        Capability::DeleteItems,
        Capability::UpdateActors,
        Capability::DeleteActors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CreateItems => "create_items",
            Capability::UpdateItems => "update_items",
            Capability::DeleteItems => "delete_items",
            Capability::UpdateActors => "update_actors",
            Capability::DeleteActors => "delete_actors",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capabilities granted to one actor. All false on creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PermissionSet {
    #[serde(default)]
    pub can_create_items: bool,
    #[serde(default)]
    pub can_update_items: bool,
    #[serde(default)]
    pub can_delete_items: bool,
    #[serde(default)]
    pub can_update_actors: bool,
    #[serde(default)]
    pub can_delete_actors: bool,
}

impl PermissionSet {
    /// Every capability granted
    pub fn all() -> Self {
        Self {
            can_create_items: true,
            can_update_items: true,
            can_delete_items: true,
            can_update_actors: true,
            can_delete_actors: true,
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        match capability {
            Capability::CreateItems => self.can_create_items,
            Capability::UpdateItems => self.can_update_items,
            Capability::DeleteItems => self.can_delete_items,
            Capability::UpdateActors => self.can_update_actors,
            Capability::DeleteActors => self.can_delete_actors,
        }
    }

    pub fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::CreateItems => self.can_create_items = true,
            Capability::UpdateItems => self.can_update_items = true,
            Capability::DeleteItems => self.can_delete_items = true,
            Capability::UpdateActors => self.can_update_actors = true,
            Capability::DeleteActors => self.can_delete_actors = true,
        }
        self
    }
}

/// Actor with its permission set, as returned by the profile endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActorProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub permissions: PermissionSet,
}

impl ActorProfile {
    pub fn new(actor: Actor, permissions: PermissionSet) -> Self {
        Self {
            id: actor.id,
            email: actor.email,
            name: actor.name,
            is_active: actor.is_active,
            created_at: actor.created_at,
            updated_at: actor.updated_at,
            permissions,
        }
    }
}

/// Display snapshot of an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActorSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&Actor> for ActorSummary {
    fn from(actor: &Actor) -> Self {
        Self {
            id: actor.id,
            name: actor.name.clone(),
            email: actor.email.clone(),
        }
    }
}

/// Insert payload for a new actor (password already hashed)
#[derive(Debug, Clone)]
pub struct NewActor {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Fields to change on an actor; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ActorChanges {
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterActor {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// Update actor request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateActor {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
}

/// JWT Claims for authenticated actors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    pub sub: String,
    pub actor_id: i32,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

impl ActorClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
