//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for usrsvc_core::User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns a single user by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, status, created_at, updated_at \
         FROM users \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all users created strictly after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_users_created_after(
    pool: &PgPool,
    since: DateTime<Utc>,
) -> Result<Vec<UserRow>, DbError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, status, created_at, updated_at \
         FROM users \
         WHERE created_at > $1 \
         ORDER BY created_at, id",
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Updates a user's name, email and status, returning the stored row.
///
/// `None` for `name` or `email` preserves the existing value; `status` is
/// always overwritten. Returns `None` if no user has the given id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    status: i16,
) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users \
         SET name = COALESCE($1, name), \
             email = COALESCE($2, email), \
             status = $3, \
             updated_at = NOW() \
         WHERE id = $4 \
         RETURNING id, name, email, status, created_at, updated_at",
    )
    .bind(name)
    .bind(email)
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns users created more than `months` months ago, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stale_users(pool: &PgPool, months: u32) -> Result<Vec<UserRow>, DbError> {
    let months = i32::try_from(months).unwrap_or(i32::MAX);
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, status, created_at, updated_at \
         FROM users \
         WHERE created_at < NOW() - make_interval(months => $1) \
         ORDER BY created_at, id",
    )
    .bind(months)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Sets `users.status` for a single user.
///
/// Returns `false` when no row matched `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_user_status(pool: &PgPool, id: Uuid, status: i16) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE users \
         SET status = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(status)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
