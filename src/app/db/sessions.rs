use sqlx::{FromRow, SqliteExecutor};
use time::OffsetDateTime;

use crate::app::domain::{timestamp, OrganizationId, SessionId, UserId};

/// Aggregate over the non-expired sessions of an organization's members.
#[derive(Debug, FromRow)]
pub struct ActiveSessionStats {
    pub active_sessions: i64,
    pub newest_created_at: Option<i64>,
}

/// Create a new session for a user. Returns the session ID.
pub async fn create<'e, E>(
    executor: E,
    user_id: &UserId,
    expires_at: OffsetDateTime,
) -> Result<String, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let session_id = SessionId::new().as_str();

    sqlx::query("INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(user_id.as_str())
        .bind(expires_at.unix_timestamp())
        .bind(timestamp::now_unix())
        .execute(executor)
        .await?;

    Ok(session_id)
}

/// Count non-expired sessions held by members of an organization.
pub async fn active_session_stats<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<ActiveSessionStats, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, ActiveSessionStats>(
        r#"
        SELECT count(s.id) AS active_sessions, max(s.created_at) AS newest_created_at
        FROM sessions s
        JOIN organization_members m ON m.user_id = s.user_id
        WHERE m.organization_id = ? AND s.expires_at > ?
        "#,
    )
    .bind(organization_id.as_str())
    .bind(timestamp::now_unix())
    .fetch_one(executor)
    .await
}

/// Distinct members with at least one non-expired session.
pub async fn count_active_users<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar(
        r#"
        SELECT count(DISTINCT s.user_id)
        FROM sessions s
        JOIN organization_members m ON m.user_id = s.user_id
        WHERE m.organization_id = ? AND s.expires_at > ?
        "#,
    )
    .bind(organization_id.as_str())
    .bind(timestamp::now_unix())
    .fetch_one(executor)
    .await
}
