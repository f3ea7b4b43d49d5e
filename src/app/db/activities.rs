//! Append-only activity log. There is deliberately no update or delete here;
//! the schema rejects both with triggers.

use sqlx::{FromRow, SqliteExecutor};

use crate::app::domain::{timestamp, ActivityId, OrganizationId, UserId};

/// Database row for activities table.
#[derive(Debug, Clone, FromRow)]
pub struct Activity {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub metadata: String,
    pub created_at: i64,
}

/// Data structure for appending an activity.
pub struct NewActivity {
    pub id: ActivityId,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub metadata: serde_json::Value,
}

/// Append an activity record.
pub async fn insert<'e, E>(executor: E, activity: &NewActivity) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO activities (id, organization_id, user_id, action, resource_type, resource_id, metadata, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(activity.id.as_str())
    .bind(activity.organization_id.as_str())
    .bind(activity.user_id.as_str())
    .bind(&activity.action)
    .bind(&activity.resource_type)
    .bind(&activity.resource_id)
    .bind(activity.metadata.to_string())
    .bind(timestamp::now_unix())
    .execute(executor)
    .await?;
    Ok(())
}

/// Find an activity by ID.
pub async fn find_by_id<'e, E>(executor: E, id: &ActivityId) -> Result<Option<Activity>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Activity>(
        "SELECT id, organization_id, user_id, action, resource_type, resource_id, metadata, created_at FROM activities WHERE id = ?",
    )
    .bind(id.as_str())
    .fetch_optional(executor)
    .await
}

/// Most recent activities for an organization, newest first. Same-second ties
/// fall back to insertion order.
pub async fn list_by_organization<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
    limit: i64,
) -> Result<Vec<Activity>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, organization_id, user_id, action, resource_type, resource_id, metadata, created_at
        FROM activities
        WHERE organization_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(organization_id.as_str())
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Timestamp of the newest activity, if any.
pub async fn latest_at<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<Option<i64>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar("SELECT max(created_at) FROM activities WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .fetch_one(executor)
        .await
}
