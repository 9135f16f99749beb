//! Actors repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::actor::{Actor, ActorChanges, NewActor, PermissionSet},
};

const ACTOR_COLUMNS: &str = "id, email, name, password, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct ActorsRepository {
    pool: Pool<Postgres>,
}

impl ActorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get actor by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Actor> {
        sqlx::query_as::<_, Actor>(&format!("SELECT {} FROM actors WHERE id = $1", ACTOR_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get actor by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<Actor>> {
        let actor = sqlx::query_as::<_, Actor>(&format!(
            "SELECT {} FROM actors WHERE LOWER(email) = LOWER($1)",
            ACTOR_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(actor)
    }

    pub async fn get_many(&self, ids: &[i32]) -> AppResult<Vec<Actor>> {
        let actors = sqlx::query_as::<_, Actor>(&format!(
            "SELECT {} FROM actors WHERE id = ANY($1)",
            ACTOR_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(actors)
    }

    /// Create an actor and its permission set in one transaction
    pub async fn create(&self, actor: &NewActor) -> AppResult<Actor> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Actor>(&format!(
            r#"
            INSERT INTO actors (email, name, password, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, TRUE, $4, $4)
            RETURNING {}
            "#,
            ACTOR_COLUMNS
        ))
        .bind(&actor.email)
        .bind(&actor.name)
        .bind(&actor.password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already in use".to_string())
            }
            other => AppError::from(other),
        })?;

        sqlx::query("INSERT INTO permissions (actor_id) VALUES ($1)")
            .bind(created.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Update name and/or password hash
    pub async fn update(&self, id: i32, changes: &ActorChanges) -> AppResult<Actor> {
        sqlx::query_as::<_, Actor>(&format!(
            r#"
            UPDATE actors SET
                name = COALESCE($1, name),
                password = COALESCE($2, password),
                updated_at = $3
            WHERE id = $4
            RETURNING {}
            "#,
            ACTOR_COLUMNS
        ))
        .bind(changes.name.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Soft delete
    pub async fn deactivate(&self, id: i32) -> AppResult<Actor> {
        sqlx::query_as::<_, Actor>(&format!(
            "UPDATE actors SET is_active = FALSE, updated_at = $1 WHERE id = $2 RETURNING {}",
            ACTOR_COLUMNS
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn get_permissions(&self, actor_id: i32) -> AppResult<Option<PermissionSet>> {
        let permissions = sqlx::query_as::<_, PermissionSet>(
            r#"
            SELECT can_create_items, can_update_items, can_delete_items,
                   can_update_actors, can_delete_actors
            FROM permissions
            WHERE actor_id = $1
            "#,
        )
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permissions)
    }

    pub async fn update_permissions(
        &self,
        actor_id: i32,
        permissions: &PermissionSet,
    ) -> AppResult<PermissionSet> {
        sqlx::query_as::<_, PermissionSet>(
            r#"
            UPDATE permissions SET
                can_create_items = $1,
                can_update_items = $2,
                can_delete_items = $3,
                can_update_actors = $4,
                can_delete_actors = $5
            WHERE actor_id = $6
            RETURNING can_create_items, can_update_items, can_delete_items,
                      can_update_actors, can_delete_actors
            "#,
        )
        .bind(permissions.can_create_items)
        .bind(permissions.can_update_items)
        .bind(permissions.can_delete_items)
        .bind(permissions.can_update_actors)
        .bind(permissions.can_delete_actors)
        .bind(actor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", actor_id)))
    }
}
