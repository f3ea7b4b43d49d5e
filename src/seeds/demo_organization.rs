use std::env;

use async_trait::async_trait;
use serde_json::json;
use sqlx::SqlitePool;

use crate::app::{
    db::{self, organizations::NewOrganization, workspaces::NewWorkspace, NewUser},
    domain::{Email, OrganizationId, OrganizationRole, UserId, WorkspaceId},
    features::activity,
    permissions::ResourceType,
    session::RequestContext,
};
use crate::seeds::{Seed, SeedOutcome};

pub const DEMO_SLUG: &str = "demo";
const DEMO_WORKSPACE: &str = "General";

/// Demo owner + organization + workspace. Runs only when `SEED_DEMO_EMAIL` is set.
pub struct DemoOrganization;

#[async_trait]
impl Seed for DemoOrganization {
    fn version(&self) -> i64 {
        20260101120000
    }

    fn description(&self) -> &str {
        "demo_organization"
    }

    async fn run(&self, pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error> {
        let email = match env::var("SEED_DEMO_EMAIL").ok().map(Email::new) {
            Some(Ok(email)) => email,
            _ => return Ok(SeedOutcome::Skipped),
        };
        seed_demo(pool, &email).await?;
        Ok(SeedOutcome::Applied)
    }
}

fn decode_id<T, E>(parsed: Result<T, E>) -> Result<T, sqlx::Error>
where
    E: std::error::Error + Send + Sync + 'static,
{
    parsed.map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Create whichever of the demo owner, organization, owner membership and
/// "General" workspace is missing. Existing rows are left as they are.
pub(crate) async fn seed_demo(pool: &SqlitePool, email: &Email) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let user_id = match db::users::find_by_email(&mut *tx, email).await? {
        Some(user) => decode_id(UserId::from_string(&user.id))?,
        None => {
            let user_id = UserId::new();
            let user = NewUser {
                id: user_id.clone(),
                email: email.clone(),
                display_name: "Demo Owner".to_string(),
            };
            db::users::insert(&mut *tx, &user).await?;
            user_id
        }
    };
    let ctx = RequestContext {
        user_id: user_id.clone(),
        session_id: None,
    };

    let org_id = match db::organizations::find_by_slug(&mut *tx, DEMO_SLUG).await? {
        Some(org) => decode_id(org.parsed_id())?,
        None => {
            let org_id = OrganizationId::new();
            let org = NewOrganization {
                id: org_id.clone(),
                slug: DEMO_SLUG.to_string(),
                name: "Demo Organization".to_string(),
            };
            db::organizations::insert(&mut *tx, &org).await?;
            activity::record(
                &mut *tx,
                &ctx,
                &org_id,
                "organization.created",
                ResourceType::Organization,
                &org_id.as_str(),
                json!({ "seeded": true }),
            )
            .await?;
            org_id
        }
    };

    if db::organizations::find_member_role(&mut *tx, &org_id, &user_id)
        .await?
        .is_none()
    {
        db::organizations::add_member(&mut *tx, &org_id, &user_id, OrganizationRole::Owner).await?;
    }

    let has_general = db::workspaces::list_by_organization(&mut *tx, &org_id)
        .await?
        .iter()
        .any(|w| w.name == DEMO_WORKSPACE);
    if !has_general {
        let workspace = NewWorkspace {
            id: WorkspaceId::new(),
            organization_id: org_id.clone(),
            name: DEMO_WORKSPACE.to_string(),
            description: Some("Default workspace".to_string()),
            metadata: json!({ "seeded": true }),
            created_by: user_id.clone(),
        };
        db::workspaces::insert(&mut *tx, &workspace).await?;
    }

    tx.commit().await?;
    tracing::info!(email = %email, organization_id = %org_id, "seeded demo organization");
    Ok(())
}
