//! Organization membership: list, add existing users by email, change roles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use validator::Validate;

use super::{activity, datetime, validate_request};
use crate::app::{
    db::{self, organizations::MemberWithEmail},
    domain::{Email, OrganizationRole, UserId},
    error::{is_unique_violation, AppError},
    extract::ApiJson,
    mail::{self, templates},
    permissions::{self, ResourceType},
    session::RequestContext,
    tenant::{self, MemberScope},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct MemberPathParams {
    pub organization_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(length(min = 1, max = 254), email)]
    pub email: String,
    pub role: OrganizationRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: OrganizationRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: OrganizationRole,
    #[serde(with = "time::serde::rfc3339")]
    pub joined_at: OffsetDateTime,
}

impl TryFrom<MemberWithEmail> for MemberResponse {
    type Error = AppError;

    fn try_from(row: MemberWithEmail) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|_| AppError::Internal)?;
        Ok(Self {
            joined_at: datetime(row.created_at)?,
            user_id: row.user_id,
            email: row.email,
            display_name: row.display_name,
            role,
        })
    }
}

fn owners_only() -> AppError {
    AppError::Forbidden("Only owners can grant or revoke the OWNER role".to_string())
}

async fn require_admin(
    state: &AppState,
    ctx: &RequestContext,
    scope: &MemberScope,
    resource_id: &str,
) -> Result<(), AppError> {
    permissions::require(
        &state.db,
        &ctx.user_id,
        &scope.organization_id,
        ResourceType::Member,
        resource_id,
        OrganizationRole::Admin,
    )
    .await
}

/// GET /api/orgs/:organization_id/members — Members with email and role.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn list_members(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;

    let members = db::organizations::list_members_with_email(&state.db, &scope.organization_id)
        .await?
        .into_iter()
        .map(MemberResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(members))
}

/// POST /api/orgs/:organization_id/members — Add an existing user (ADMIN or above).
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        organization_id = %organization_id
    )
)]
pub async fn add_member(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    body: Result<ApiJson<AddMemberRequest>, AppError>,
) -> Result<(StatusCode, Json<MemberResponse>), AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &organization_id).await?;
    require_admin(&state, &ctx, &scope, &scope.organization.id).await?;

    let ApiJson(request) = body?;
    validate_request(&request)?;
    if request.role == OrganizationRole::Owner && scope.role != OrganizationRole::Owner {
        return Err(owners_only());
    }

    let email = Email::new(&request.email).map_err(|_| AppError::invalid_input())?;
    let user = db::users::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let new_member_id = UserId::from_string(&user.id).map_err(|_| AppError::Internal)?;
    let org_id = &scope.organization_id;

    if db::organizations::find_member_role(&state.db, org_id, &new_member_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("User is already a member".to_string()));
    }

    let mut tx = state.db.begin().await?;
    db::organizations::add_member(&mut *tx, org_id, &new_member_id, request.role)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict("User is already a member".to_string())
            } else {
                AppError::Database(err)
            }
        })?;
    activity::record(
        &mut *tx,
        &ctx,
        org_id,
        "member.added",
        ResourceType::Member,
        &user.id,
        json!({ "role": request.role }),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(member_id = %new_member_id, role = %request.role, "member added");

    let added_by = db::users::find_by_id(&state.db, &ctx.user_id)
        .await?
        .map(|u| u.email)
        .unwrap_or_else(|| "An administrator".to_string());
    let message = templates::member_added(
        email,
        &scope.organization,
        request.role,
        &added_by,
        state.config.app_url_base(),
    );
    mail::deliver(state.mail.as_ref(), message).await;

    let member = db::organizations::find_member_with_email(&state.db, org_id, &new_member_id)
        .await?
        .ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(member.try_into()?)))
}

/// PATCH /api/orgs/:organization_id/members/:user_id — Change a member's role (ADMIN or above).
///
/// Only owners may touch the OWNER role, and the last owner cannot be demoted.
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %ctx.user_id,
        session_id = ?ctx.session_id,
        member_id = %params.user_id
    )
)]
pub async fn update_member(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(params): Path<MemberPathParams>,
    body: Result<ApiJson<UpdateMemberRequest>, AppError>,
) -> Result<Json<MemberResponse>, AppError> {
    let scope = tenant::member_scope_by_id(&state.db, &ctx, &params.organization_id).await?;
    require_admin(&state, &ctx, &scope, &params.user_id).await?;
    let ApiJson(request) = body?;

    let not_found = || AppError::NotFound("Member not found".to_string());
    let member_id = UserId::from_string(&params.user_id).map_err(|_| not_found())?;
    let org_id = &scope.organization_id;

    let mut tx = state.db.begin().await?;
    let current = db::organizations::find_member_role(&mut *tx, org_id, &member_id)
        .await?
        .ok_or_else(not_found)?;

    let touches_owner = current == OrganizationRole::Owner || request.role == OrganizationRole::Owner;
    if touches_owner && scope.role != OrganizationRole::Owner {
        return Err(owners_only());
    }

    if current == OrganizationRole::Owner && request.role != OrganizationRole::Owner {
        let owners =
            db::organizations::count_members_with_role(&mut *tx, org_id, OrganizationRole::Owner).await?;
        if owners <= 1 {
            return Err(AppError::Conflict(
                "An organization must keep at least one owner".to_string(),
            ));
        }
    }

    if current != request.role {
        db::organizations::update_member_role(&mut *tx, org_id, &member_id, request.role).await?;
        activity::record(
            &mut *tx,
            &ctx,
            org_id,
            "member.role_changed",
            ResourceType::Member,
            &params.user_id,
            json!({ "from": current, "to": request.role }),
        )
        .await?;
    }
    tx.commit().await?;

    let member = db::organizations::find_member_with_email(&state.db, org_id, &member_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(member.try_into()?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orgs/:organization_id/members",
            get(list_members).post(add_member),
        )
        .route("/api/orgs/:organization_id/members/:user_id", patch(update_member))
}
