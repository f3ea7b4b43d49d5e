//! Workspaces: named containers scoped to one organization.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{de::Deserializer, Deserialize, Serialize};
use serde_json::{json, Value};
use time::OffsetDateTime;
use validator::Validate;

use super::{activity, datetime, invalid, validate_request};
use crate::app::{
    db::{self, workspaces::{NewWorkspace, Workspace, WorkspaceChanges}},
    domain::{validation_helpers, OrganizationId, OrganizationRole, WorkspaceId},
    error::AppError,
    extract::ApiJson,
    permissions::{self, ResourceType},
    session::RequestContext,
    tenant, AppState,
};

const MAX_DESCRIPTION_LEN: usize = 1000;

/// Path parameters for workspace endpoints with ID.
#[derive(Debug, Deserialize)]
pub struct WorkspacePathParams {
    pub organization_id: String,
    pub id: String,
}

/// Missing key => None, present null => Some(None), present value => Some(Some(v)).
/// Distinguishes "leave description unchanged" from "clear description".
fn deserialize_optional_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkspaceRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub metadata: Option<Value>,
}

/// Partial update. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkspaceRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Omit = unchanged, null = clear.
    #[serde(default, deserialize_with = "deserialize_optional_option")]
    pub description: Option<Option<String>>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub description: Option<String>,
    pub metadata: Value,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<Workspace> for WorkspaceResponse {
    type Error = AppError;

    fn try_from(row: Workspace) -> Result<Self, Self::Error> {
        Ok(Self {
            metadata: parse_metadata(&row.metadata),
            created_at: datetime(row.created_at)?,
            updated_at: datetime(row.updated_at)?,
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            created_by: row.created_by,
        })
    }
}

fn parse_metadata(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({}))
}

fn trimmed_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("Name is required."));
    }
    Ok(name.to_string())
}

/// Load a workspace and make sure it belongs to `organization_id`.
async fn load_workspace(
    pool: &sqlx::SqlitePool,
    organization_id: &OrganizationId,
    id: &str,
) -> Result<Workspace, AppError> {
    db::workspaces::find_by_id(pool, id)
        .await?
        .filter(|w| w.organization_id == organization_id.as_str())
        .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))
}

/// GET /api/orgs/:organization_id/workspaces — All workspaces in the organization.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn list_workspaces(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<Vec<WorkspaceResponse>>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;

    let workspaces = db::workspaces::list_by_organization(&state.db, &scope.organization_id)
        .await?
        .into_iter()
        .map(WorkspaceResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(workspaces))
}

/// POST /api/orgs/:organization_id/workspaces — Create a workspace (EDITOR or above).
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn create_workspace(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    body: Result<ApiJson<CreateWorkspaceRequest>, AppError>,
) -> Result<(StatusCode, Json<WorkspaceResponse>), AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;
    let org_id = scope.organization_id;
    permissions::require(
        &state.db,
        &ctx.user_id,
        &org_id,
        ResourceType::Workspace,
        &org_id.as_str(),
        OrganizationRole::Editor,
    )
    .await?;

    let ApiJson(request) = body?;
    validate_request(&request)?;
    let name = trimmed_name(&request.name)?;
    validation_helpers::check_json_object(request.metadata.as_ref()).map_err(invalid)?;

    let workspace_id = WorkspaceId::new();
    let new_workspace = NewWorkspace {
        id: workspace_id.clone(),
        organization_id: org_id.clone(),
        name: name.clone(),
        description: validation_helpers::non_blank(request.description.as_deref()),
        metadata: request.metadata.unwrap_or_else(|| json!({})),
        created_by: ctx.user_id.clone(),
    };

    let mut tx = state.db.begin().await?;
    db::workspaces::insert(&mut *tx, &new_workspace).await?;
    activity::record(
        &mut *tx,
        &ctx,
        &org_id,
        "workspace.created",
        ResourceType::Workspace,
        &workspace_id.as_str(),
        json!({ "name": name }),
    )
    .await?;
    tx.commit().await?;

    let workspace = db::workspaces::find_by_id(&state.db, &workspace_id.as_str())
        .await?
        .ok_or(AppError::Internal)?;
    tracing::info!(workspace_id = %workspace_id, "workspace created");

    Ok((StatusCode::CREATED, Json(workspace.try_into()?)))
}

/// GET /api/orgs/:organization_id/workspaces/:id — One workspace.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        workspace_id = %params.id
    )
)]
pub async fn show_workspace(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(params): Path<WorkspacePathParams>,
) -> Result<Json<WorkspaceResponse>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &params.organization_id).await?;
    let workspace = load_workspace(&state.db, &scope.organization_id, &params.id).await?;
    Ok(Json(workspace.try_into()?))
}

/// PATCH /api/orgs/:organization_id/workspaces/:id — Partial update (EDITOR or above).
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        workspace_id = %params.id
    )
)]
pub async fn update_workspace(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(params): Path<WorkspacePathParams>,
    body: Result<ApiJson<UpdateWorkspaceRequest>, AppError>,
) -> Result<Json<WorkspaceResponse>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &params.organization_id).await?;
    let org_id = scope.organization_id;
    permissions::require(
        &state.db,
        &ctx.user_id,
        &org_id,
        ResourceType::Workspace,
        &params.id,
        OrganizationRole::Editor,
    )
    .await?;

    let ApiJson(request) = body?;
    validate_request(&request)?;
    let name = request.name.as_deref().map(trimmed_name).transpose()?;
    if let Some(Some(description)) = &request.description {
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::invalid_input());
        }
    }
    validation_helpers::check_json_object(request.metadata.as_ref()).map_err(invalid)?;

    let existing = load_workspace(&state.db, &org_id, &params.id).await?;

    let mut changed = Vec::new();
    if name.is_some() {
        changed.push("name");
    }
    if request.description.is_some() {
        changed.push("description");
    }
    if request.metadata.is_some() {
        changed.push("metadata");
    }

    let name = name.unwrap_or(existing.name);
    let description = match request.description {
        Some(new) => validation_helpers::non_blank(new.as_deref()),
        None => existing.description,
    };
    let metadata = request
        .metadata
        .unwrap_or_else(|| parse_metadata(&existing.metadata));

    let changes = WorkspaceChanges {
        name: &name,
        description: description.as_deref(),
        metadata: &metadata,
    };

    let mut tx = state.db.begin().await?;
    db::workspaces::update(&mut *tx, &existing.id, &changes).await?;
    activity::record(
        &mut *tx,
        &ctx,
        &org_id,
        "workspace.updated",
        ResourceType::Workspace,
        &existing.id,
        json!({ "fields": changed }),
    )
    .await?;
    tx.commit().await?;

    let workspace = db::workspaces::find_by_id(&state.db, &existing.id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok(Json(workspace.try_into()?))
}

/// DELETE /api/orgs/:organization_id/workspaces/:id — Delete a workspace (ADMIN or above).
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        workspace_id = %params.id
    )
)]
pub async fn delete_workspace(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(params): Path<WorkspacePathParams>,
) -> Result<StatusCode, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &params.organization_id).await?;
    let org_id = scope.organization_id;
    permissions::require(
        &state.db,
        &ctx.user_id,
        &org_id,
        ResourceType::Workspace,
        &params.id,
        OrganizationRole::Admin,
    )
    .await?;

    let existing = load_workspace(&state.db, &org_id, &params.id).await?;

    let mut tx = state.db.begin().await?;
    db::workspaces::delete(&mut *tx, &existing.id).await?;
    activity::record(
        &mut *tx,
        &ctx,
        &org_id,
        "workspace.deleted",
        ResourceType::Workspace,
        &existing.id,
        json!({ "name": existing.name }),
    )
    .await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orgs/:organization_id/workspaces",
            get(list_workspaces).post(create_workspace),
        )
        .route(
            "/api/orgs/:organization_id/workspaces/:id",
            get(show_workspace)
                .patch(update_workspace)
                .delete(delete_workspace),
        )
}
