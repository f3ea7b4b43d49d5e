//! Organization activity feed: append-only audit records, read through the cache.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqliteExecutor;
use time::OffsetDateTime;
use validator::Validate;

use super::{datetime, invalid, validate_request};
use crate::app::{
    cache,
    db::{self, activities::{Activity, NewActivity}},
    domain::{validation_helpers, ActivityId, OrganizationId},
    error::AppError,
    extract::ApiJson,
    permissions::ResourceType,
    session::RequestContext,
    tenant, AppState,
};

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

/// Query for GET activity. `limit` is parsed by hand so bad input renders as a JSON 400.
#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<String>,
}

/// Request body for recording a custom activity.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateActivityRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100))]
    pub kind: String,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub organization_id: String,
    pub user_id: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub metadata: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<Activity> for ActivityResponse {
    type Error = AppError;

    fn try_from(row: Activity) -> Result<Self, Self::Error> {
        let metadata = serde_json::from_str(&row.metadata).unwrap_or(Value::Null);
        Ok(Self {
            created_at: datetime(row.created_at)?,
            id: row.id,
            organization_id: row.organization_id,
            user_id: row.user_id,
            action: row.action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            metadata,
        })
    }
}

/// Missing limit uses the default; anything else is clamped to `1..=MAX_LIMIT`.
fn parse_limit(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(DEFAULT_LIMIT),
        Some(s) => s
            .parse::<i64>()
            .map(|n| n.clamp(1, MAX_LIMIT))
            .map_err(|_| invalid("limit must be an integer.")),
    }
}

/// Append an activity record on behalf of the caller. Used by every write path.
pub async fn record<'e, E>(
    executor: E,
    ctx: &RequestContext,
    organization_id: &OrganizationId,
    action: &str,
    resource_type: ResourceType,
    resource_id: &str,
    metadata: Value,
) -> Result<ActivityId, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = ActivityId::new();
    let activity = NewActivity {
        id: id.clone(),
        organization_id: organization_id.clone(),
        user_id: ctx.user_id.clone(),
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id: resource_id.to_string(),
        metadata,
    };
    db::activities::insert(executor, &activity).await?;
    tracing::debug!(activity_id = %id, action, "activity recorded");
    Ok(id)
}

async fn load_activity(
    pool: &sqlx::SqlitePool,
    organization_id: &OrganizationId,
    limit: i64,
) -> Result<Vec<ActivityResponse>, AppError> {
    db::activities::list_by_organization(pool, organization_id, limit)
        .await?
        .into_iter()
        .map(ActivityResponse::try_from)
        .collect()
}

/// GET /api/orgs/:organization_id/activity?limit=N — Newest-first activity, cached per limit.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn list_activity(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;
    let limit = parse_limit(query.limit.as_deref())?;

    let key = format!("{}:{limit}", cache::org_key("activity", &scope.organization_id));
    let items = cache::read_through(state.cache.as_ref(), &key, || {
        load_activity(&state.db, &scope.organization_id, limit)
    })
    .await?;

    Ok(Json(items))
}

/// POST /api/orgs/:organization_id/activity — Record a custom activity.
///
/// Cached feeds are not invalidated; the new record shows up once the cached entry expires.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn create_activity(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    body: Result<ApiJson<CreateActivityRequest>, AppError>,
) -> Result<(StatusCode, Json<ActivityResponse>), AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;

    let ApiJson(request) = body?;
    validate_request(&request)?;
    let kind = request.kind.trim();
    if kind.is_empty() {
        return Err(invalid("type is required."));
    }
    validation_helpers::check_json_object(request.details.as_ref()).map_err(invalid)?;
    let details = request.details.unwrap_or_else(|| Value::Object(Default::default()));

    let org_id = scope.organization_id;
    let id = record(
        &state.db,
        &ctx,
        &org_id,
        kind,
        ResourceType::Organization,
        &org_id.as_str(),
        details,
    )
    .await?;

    let row = db::activities::find_by_id(&state.db, &id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(row.try_into()?)))
}

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/orgs/:organization_id/activity",
        get(list_activity).post(create_activity),
    )
}
