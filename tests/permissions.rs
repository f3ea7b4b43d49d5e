use orgspace::app::{
    domain::{OrganizationId, OrganizationRole},
    permissions::{self, ResourceType},
};

mod common;

use crate::common::*;

#[tokio::test]
async fn check_allows_exactly_roles_at_or_above_required() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let org = create_org(&pool, "acme", &owner).await;

    for held in OrganizationRole::ALL {
        let user = if held == OrganizationRole::Owner {
            owner.clone()
        } else {
            member_with_role(&pool, &org, &format!("{held}@example.com"), held).await
        };

        for required in OrganizationRole::ALL {
            let allowed = permissions::check(
                &pool,
                &user,
                &org,
                ResourceType::Workspace,
                "any",
                required,
            )
            .await
            .unwrap();
            assert_eq!(
                allowed,
                held.rank() >= required.rank(),
                "held {held} required {required}"
            );
        }
    }
}

#[tokio::test]
async fn non_members_and_unknown_orgs_are_denied() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let outsider = create_user(&pool, "outsider@example.com").await;
    let org = create_org(&pool, "acme", &owner).await;

    let denied = permissions::check(
        &pool,
        &outsider,
        &org,
        ResourceType::Organization,
        &org.as_str(),
        OrganizationRole::Viewer,
    )
    .await
    .unwrap();
    assert!(!denied);

    let missing = OrganizationId::new();
    let denied = permissions::check(
        &pool,
        &owner,
        &missing,
        ResourceType::Organization,
        "missing",
        OrganizationRole::Viewer,
    )
    .await
    .unwrap();
    assert!(!denied);
}

#[tokio::test]
async fn require_maps_denial_to_forbidden() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let org = create_org(&pool, "acme", &owner).await;
    let viewer = member_with_role(&pool, &org, "viewer@example.com", OrganizationRole::Viewer).await;

    let result = permissions::require(
        &pool,
        &viewer,
        &org,
        ResourceType::Member,
        "x",
        OrganizationRole::Admin,
    )
    .await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
}
