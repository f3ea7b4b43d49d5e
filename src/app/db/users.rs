use sqlx::{FromRow, SqliteExecutor};

use crate::app::domain::{timestamp, Email, UserId};

/// Database row for users table. Rows are owned by the upstream auth layer.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: i64,
}

/// Data structure for inserting a new user (seeds and tests).
pub struct NewUser {
    pub id: UserId,
    pub email: Email,
    pub display_name: String,
}

/// Find a user by email address.
pub async fn find_by_email<'e, E>(executor: E, email: &Email) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "SELECT id, email, display_name, created_at FROM users WHERE email = ?",
    )
    .bind(email.as_str())
    .fetch_optional(executor)
    .await
}

/// Find a user by ID.
pub async fn find_by_id<'e, E>(executor: E, user_id: &UserId) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>("SELECT id, email, display_name, created_at FROM users WHERE id = ?")
        .bind(user_id.as_str())
        .fetch_optional(executor)
        .await
}

/// Insert a new user into the database.
pub async fn insert<'e, E>(executor: E, user: &NewUser) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("INSERT INTO users (id, email, display_name, created_at) VALUES (?, ?, ?, ?)")
        .bind(user.id.as_str())
        .bind(user.email.as_str())
        .bind(&user.display_name)
        .bind(timestamp::now_unix())
        .execute(executor)
        .await?;
    Ok(())
}
