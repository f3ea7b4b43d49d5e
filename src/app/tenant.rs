//! Tenant resolution and isolation.
//!
//! **Rule**: validate membership on every read and write. Order matters:
//! unknown organization is 404 before membership (403) is considered.

use sqlx::SqlitePool;

use crate::app::{
    db::{self, organizations::Organization},
    domain::{OrganizationId, OrganizationRole},
    error::AppError,
    session::RequestContext,
};

/// An organization the caller has been confirmed to belong to.
#[derive(Debug)]
pub struct MemberScope {
    pub organization: Organization,
    pub organization_id: OrganizationId,
    pub role: OrganizationRole,
}

fn org_not_found() -> AppError {
    AppError::NotFound("Organization not found".to_string())
}

/// Resolve an organization by its URL slug.
pub async fn org_by_slug(pool: &SqlitePool, slug: &str) -> Result<Organization, AppError> {
    db::organizations::find_by_slug(pool, slug)
        .await?
        .ok_or_else(org_not_found)
}

/// Resolve an organization by id. A malformed id is indistinguishable from a missing one.
pub async fn org_by_id(pool: &SqlitePool, raw_id: &str) -> Result<Organization, AppError> {
    let id = OrganizationId::from_string(raw_id).map_err(|_| org_not_found())?;
    db::organizations::find_by_id(pool, &id)
        .await?
        .ok_or_else(org_not_found)
}

/// Confirm the caller belongs to `organization`. Returns the caller's role.
pub async fn require_org_member(
    pool: &SqlitePool,
    ctx: &RequestContext,
    organization: Organization,
) -> Result<MemberScope, AppError> {
    let organization_id = organization.parsed_id().map_err(|_| AppError::Internal)?;
    let role = db::organizations::find_member_role(pool, &organization_id, &ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Not a member of this organization".to_string()))?;

    Ok(MemberScope {
        organization,
        organization_id,
        role,
    })
}

/// `org_by_id` followed by `require_org_member`.
pub async fn member_scope_by_id(
    pool: &SqlitePool,
    ctx: &RequestContext,
    raw_id: &str,
) -> Result<MemberScope, AppError> {
    let organization = org_by_id(pool, raw_id).await?;
    require_org_member(pool, ctx, organization).await
}

/// `org_by_slug` followed by `require_org_member`.
pub async fn member_scope_by_slug(
    pool: &SqlitePool,
    ctx: &RequestContext,
    slug: &str,
) -> Result<MemberScope, AppError> {
    let organization = org_by_slug(pool, slug).await?;
    require_org_member(pool, ctx, organization).await
}
