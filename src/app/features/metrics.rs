//! Derived per-organization aggregates. Always recomputable from rows, so they are
//! served through the response cache and may lag writes by up to one TTL.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use super::datetime;
use crate::app::{
    cache, db,
    domain::{timestamp, OrganizationId},
    error::AppError,
    session::RequestContext,
    tenant, AppState,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionsResponse {
    pub active_sessions: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_activity_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub active_users: i64,
    pub workspace_count: i64,
}

/// Newest of: latest activity, newest active member session, or now when neither exists.
async fn load_active_sessions(
    pool: &SqlitePool,
    organization_id: &OrganizationId,
) -> Result<ActiveSessionsResponse, AppError> {
    let stats = db::sessions::active_session_stats(pool, organization_id).await?;
    let latest_activity = db::activities::latest_at(pool, organization_id).await?;

    let last = latest_activity
        .into_iter()
        .chain(stats.newest_created_at)
        .max()
        .unwrap_or_else(timestamp::now_unix);

    Ok(ActiveSessionsResponse {
        active_sessions: stats.active_sessions,
        last_activity_at: datetime(last)?,
    })
}

async fn load_metrics(
    pool: &SqlitePool,
    organization_id: &OrganizationId,
) -> Result<MetricsResponse, AppError> {
    Ok(MetricsResponse {
        active_users: db::sessions::count_active_users(pool, organization_id).await?,
        workspace_count: db::workspaces::count_by_organization(pool, organization_id).await?,
    })
}

/// GET /api/org/:slug/active-sessions — Live session count for an organization.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        slug = %slug
    )
)]
pub async fn active_sessions(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ActiveSessionsResponse>, AppError> {
    let scope = tenant::member_scope_by_slug(&state.db, &ctx, &slug).await?;

    let key = cache::org_key("active-sessions", &scope.organization_id);
    let response = cache::read_through(state.cache.as_ref(), &key, || {
        load_active_sessions(&state.db, &scope.organization_id)
    })
    .await?;

    Ok(Json(response))
}

/// GET /api/orgs/:organization_id/metrics — Active users and workspace count.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn organization_metrics(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<MetricsResponse>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;

    let key = cache::org_key("metrics", &scope.organization_id);
    let response = cache::read_through(state.cache.as_ref(), &key, || {
        load_metrics(&state.db, &scope.organization_id)
    })
    .await?;

    Ok(Json(response))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/org/:slug/active-sessions", get(active_sessions))
        .route("/api/orgs/:organization_id/metrics", get(organization_metrics))
}
