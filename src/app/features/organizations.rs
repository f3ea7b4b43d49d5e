//! Organization lifecycle: create, list the caller's organizations, show one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use validator::Validate;

use super::{activity, datetime, invalid, validate_request};
use crate::app::{
    db::{self, organizations::{Membership, NewOrganization}},
    domain::{validation_helpers, Email, OrganizationId, OrganizationRole},
    error::{is_unique_violation, AppError},
    extract::ApiJson,
    mail::{self, templates},
    permissions::ResourceType,
    session::RequestContext,
    tenant, AppState,
};

/// Request body for creating an organization. Slug is derived from the name when omitted.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
}

/// Organization as seen by one member.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub role: OrganizationRole,
}

#[derive(Debug, Serialize)]
pub struct OrganizationListResponse {
    pub organizations: Vec<OrganizationResponse>,
}

impl OrganizationResponse {
    fn new(
        id: String,
        slug: String,
        name: String,
        created_at: i64,
        role: OrganizationRole,
    ) -> Result<Self, AppError> {
        Ok(Self {
            id,
            slug,
            name,
            created_at: datetime(created_at)?,
            role,
        })
    }
}

impl TryFrom<Membership> for OrganizationResponse {
    type Error = AppError;

    fn try_from(row: Membership) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|_| AppError::Internal)?;
        Self::new(row.id, row.slug, row.name, row.created_at, role)
    }
}

/// POST /api/orgs — Create an organization; the caller becomes its owner.
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, session_id = ?ctx.session_id))]
pub async fn create_organization(
    ctx: RequestContext,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), AppError> {
    validate_request(&request)?;

    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(invalid("Name is required."));
    }
    let slug = validation_helpers::non_blank(request.slug.as_deref())
        .unwrap_or_else(|| validation_helpers::slugify(&name));
    validation_helpers::check_slug(&slug).map_err(invalid)?;

    // Identity comes from upstream; the user row must exist before it can own anything.
    let user = db::users::find_by_id(&state.db, &ctx.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if db::organizations::find_by_slug(&state.db, &slug).await?.is_some() {
        return Err(AppError::Conflict("Slug is already taken".to_string()));
    }

    let organization_id = OrganizationId::new();
    let new_org = NewOrganization {
        id: organization_id.clone(),
        slug: slug.clone(),
        name: name.clone(),
    };

    let mut tx = state.db.begin().await?;
    db::organizations::insert(&mut *tx, &new_org)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict("Slug is already taken".to_string())
            } else {
                AppError::Database(err)
            }
        })?;
    db::organizations::add_member(&mut *tx, &organization_id, &ctx.user_id, OrganizationRole::Owner).await?;
    activity::record(
        &mut *tx,
        &ctx,
        &organization_id,
        "organization.created",
        ResourceType::Organization,
        &organization_id.as_str(),
        json!({ "name": name, "slug": slug }),
    )
    .await?;
    tx.commit().await?;

    let organization = db::organizations::find_by_id(&state.db, &organization_id)
        .await?
        .ok_or(AppError::Internal)?;
    tracing::info!(organization_id = %organization_id, slug = %organization.slug, "organization created");

    if let Ok(to) = Email::new(&user.email) {
        let message = templates::organization_created(to, &organization, state.config.app_url_base());
        mail::deliver(state.mail.as_ref(), message).await;
    }

    let response = OrganizationResponse::new(
        organization.id,
        organization.slug,
        organization.name,
        organization.created_at,
        OrganizationRole::Owner,
    )?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/orgs — Organizations the caller belongs to.
#[tracing::instrument(skip_all, fields(user_id = %ctx.user_id, session_id = ?ctx.session_id))]
pub async fn list_organizations(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<OrganizationListResponse>, AppError> {
    let rows = db::organizations::list_for_user(&state.db, &ctx.user_id).await?;

    let organizations = rows
        .into_iter()
        .map(OrganizationResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(OrganizationListResponse { organizations }))
}

/// GET /api/orgs/:organization_id — One organization plus the caller's role.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn show_organization(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;
    let org = scope.organization;
    let response = OrganizationResponse::new(org.id, org.slug, org.name, org.created_at, scope.role)?;
    Ok(Json(response))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orgs", get(list_organizations).post(create_organization))
        .route("/api/orgs/:organization_id", get(show_organization))
}
