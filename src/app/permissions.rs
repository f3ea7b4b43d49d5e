//! Organization-level access control.
//!
//! A caller is allowed iff they hold a membership in the organization whose role
//! ranks at or above the required level. The resource type and id are carried for
//! tracing; every resource type currently resolves to the same organization-role check.

use sqlx::SqliteExecutor;
use strum_macros::{AsRefStr, Display};

use crate::app::{
    db,
    domain::{OrganizationId, OrganizationRole, UserId},
    error::AppError,
};

/// Kinds of resources an action can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceType {
    Organization,
    Workspace,
    Member,
    Activity,
    Metrics,
}

/// Check whether `user_id` may act on a resource inside `organization_id` at `required`.
///
/// Missing membership (or a missing organization) is `Ok(false)`; only repository
/// failures are errors.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %user_id,
        organization_id = %organization_id,
        resource_type = %resource_type,
        resource_id = resource_id,
        required = %required
    )
)]
pub async fn check<'e, E>(
    executor: E,
    user_id: &UserId,
    organization_id: &OrganizationId,
    resource_type: ResourceType,
    resource_id: &str,
    required: OrganizationRole,
) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let role = db::organizations::find_member_role(executor, organization_id, user_id).await?;
    let allowed = role.is_some_and(|r| r.satisfies(required));
    tracing::debug!(?role, %required, allowed, "permission check");
    Ok(allowed)
}

/// Like [`check`], but a denial is `Forbidden`.
pub async fn require<'e, E>(
    executor: E,
    user_id: &UserId,
    organization_id: &OrganizationId,
    resource_type: ResourceType,
    resource_id: &str,
    required: OrganizationRole,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    if check(executor, user_id, organization_id, resource_type, resource_id, required).await? {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}
