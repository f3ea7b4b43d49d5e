use sqlx::{FromRow, SqliteExecutor};

use crate::app::domain::{timestamp, OrganizationId, UserId, WorkspaceId};

/// Database row for workspaces table. `metadata` holds a JSON object as text.
#[derive(Debug, Clone, FromRow)]
pub struct Workspace {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub metadata: String,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Data structure for inserting a new workspace.
pub struct NewWorkspace {
    pub id: WorkspaceId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_by: UserId,
}

/// Full replacement of the mutable workspace fields.
pub struct WorkspaceChanges<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub metadata: &'a serde_json::Value,
}

const COLUMNS: &str =
    "id, organization_id, name, description, metadata, created_by, created_at, updated_at";

/// Insert a new workspace.
pub async fn insert<'e, E>(executor: E, workspace: &NewWorkspace) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = timestamp::now_unix();
    sqlx::query(
        "INSERT INTO workspaces (id, organization_id, name, description, metadata, created_by, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(workspace.id.as_str())
    .bind(workspace.organization_id.as_str())
    .bind(&workspace.name)
    .bind(&workspace.description)
    .bind(workspace.metadata.to_string())
    .bind(workspace.created_by.as_str())
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// Find a workspace by ID (any organization; callers must check ownership).
pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<Workspace>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Workspace>(&format!("SELECT {COLUMNS} FROM workspaces WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// All workspaces of an organization, oldest first.
pub async fn list_by_organization<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<Vec<Workspace>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, Workspace>(&format!(
        "SELECT {COLUMNS} FROM workspaces WHERE organization_id = ? ORDER BY created_at, rowid"
    ))
    .bind(organization_id.as_str())
    .fetch_all(executor)
    .await
}

/// Update name, description and metadata; bumps updated_at.
pub async fn update<'e, E>(
    executor: E,
    id: &str,
    changes: &WorkspaceChanges<'_>,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE workspaces SET name = ?, description = ?, metadata = ?, updated_at = ? WHERE id = ?",
    )
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.metadata.to_string())
    .bind(timestamp::now_unix())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Delete a workspace.
pub async fn delete<'e, E>(executor: E, id: &str) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM workspaces WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn count_by_organization<'e, E>(
    executor: E,
    organization_id: &OrganizationId,
) -> Result<i64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_scalar("SELECT count(*) FROM workspaces WHERE organization_id = ?")
        .bind(organization_id.as_str())
        .fetch_one(executor)
        .await
}
