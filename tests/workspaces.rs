use orgspace::app::domain::OrganizationRole;
use serde_json::json;

mod common;

use crate::common::*;

fn workspaces_uri(org: &impl std::fmt::Display) -> String {
    format!("/api/orgs/{org}/workspaces")
}

#[tokio::test]
async fn editor_can_create_and_list_workspaces() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;
    let editor = member_with_role(&app.pool, &org, "editor@example.com", OrganizationRole::Editor).await;

    let (status, created) = post(
        &app,
        &workspaces_uri(&org),
        &editor,
        json!({ "name": "  Roadmap  ", "description": "Q3 plans", "metadata": { "color": "blue" } }),
    )
    .await;

    assert_eq!(status, http::StatusCode::CREATED);
    assert_eq!(created["name"], "Roadmap");
    assert_eq!(created["description"], "Q3 plans");
    assert_eq!(created["metadata"]["color"], "blue");
    assert_eq!(created["organizationId"], org.as_str());
    assert_eq!(created["createdBy"], editor.as_str());

    let (status, list) = get(&app, &workspaces_uri(&org), &editor).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], created["id"]);
}

#[tokio::test]
async fn viewer_cannot_create_workspace() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;
    let viewer = member_with_role(&app.pool, &org, "viewer@example.com", OrganizationRole::Viewer).await;

    let (status, body) = post(&app, &workspaces_uri(&org), &viewer, json!({ "name": "Nope" })).await;

    assert_eq!(status, http::StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(activity_count(&app.pool, &org).await, 0);

    // Viewers can still read.
    let (status, _) = get(&app, &workspaces_uri(&org), &viewer).await;
    assert_eq!(status, http::StatusCode::OK);
}

#[tokio::test]
async fn non_member_is_forbidden_and_unknown_org_is_not_found() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let outsider = create_user(&app.pool, "outsider@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;

    let (status, _) = get(&app, &workspaces_uri(&org), &outsider).await;
    assert_eq!(status, http::StatusCode::FORBIDDEN);

    // An outsider posting to a missing org sees 404, not 403.
    let missing = orgspace::app::domain::OrganizationId::new();
    let (status, _) = post(&app, &workspaces_uri(&missing), &outsider, json!({ "name": "x" })).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_workspace_input_is_rejected() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;

    let (status, body) = post(&app, &workspaces_uri(&org), &owner, json!({ "name": "   " })).await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = post(
        &app,
        &workspaces_uri(&org),
        &owner,
        json!({ "name": "ok", "metadata": [1, 2, 3] }),
    )
    .await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_is_partial_and_recorded() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;

    let (_, created) = post(
        &app,
        &workspaces_uri(&org),
        &owner,
        json!({ "name": "Alpha", "description": "first" }),
    )
    .await;
    let uri = format!("{}/{}", workspaces_uri(&org), created["id"].as_str().unwrap());

    let (status, updated) = call(&app, "PATCH", &uri, Some(&owner), Some(json!({ "name": "Beta" }))).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(updated["name"], "Beta");
    assert_eq!(updated["description"], "first");

    let (status, cleared) =
        call(&app, "PATCH", &uri, Some(&owner), Some(json!({ "description": null }))).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(cleared["name"], "Beta");
    assert!(cleared["description"].is_null());

    let actions: Vec<String> = sqlx::query_scalar(
        "SELECT action FROM activities WHERE organization_id = ? ORDER BY created_at, rowid",
    )
    .bind(org.as_str())
    .fetch_all(&app.pool)
    .await
    .unwrap();
    assert_eq!(actions, vec!["workspace.created", "workspace.updated", "workspace.updated"]);
}

#[tokio::test]
async fn delete_requires_admin() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;
    let editor = member_with_role(&app.pool, &org, "editor@example.com", OrganizationRole::Editor).await;
    let admin = member_with_role(&app.pool, &org, "admin@example.com", OrganizationRole::Admin).await;

    let (_, created) = post(&app, &workspaces_uri(&org), &editor, json!({ "name": "Temp" })).await;
    let uri = format!("{}/{}", workspaces_uri(&org), created["id"].as_str().unwrap());

    let (status, _) = call(&app, "DELETE", &uri, Some(&editor), None).await;
    assert_eq!(status, http::StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, http::StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = get(&app, &uri, &admin).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn workspace_from_another_org_is_not_found() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let acme = create_org(&app.pool, "acme", &owner).await;
    let globex = create_org(&app.pool, "globex", &owner).await;

    let (_, created) = post(&app, &workspaces_uri(&acme), &owner, json!({ "name": "Private" })).await;
    let foreign = format!("{}/{}", workspaces_uri(&globex), created["id"].as_str().unwrap());

    let (status, body) = get(&app, &foreign, &owner).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Workspace not found");

    let (status, _) = call(&app, "DELETE", &foreign, Some(&owner), None).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn viewer_with_invalid_body_is_forbidden() {
    let app = test_app().await;
    let owner = create_user(&app.pool, "owner@example.com").await;
    let org = create_org(&app.pool, "acme", &owner).await;
    let viewer = member_with_role(&app.pool, &org, "viewer@example.com", OrganizationRole::Viewer).await;

    let (status, body) = post(&app, &workspaces_uri(&org), &viewer, json!({ "description": "x" })).await;

    assert_eq!(status, http::StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn unknown_org_with_invalid_body_is_not_found() {
    let app = test_app().await;
    let user = create_user(&app.pool, "someone@example.com").await;
    let missing = orgspace::app::domain::OrganizationId::new();

    let (status, body) = post(&app, &workspaces_uri(&missing), &user, json!({})).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let uri = format!("{}/{}", workspaces_uri(&missing), orgspace::app::domain::WorkspaceId::new());
    let (status, _) = call(&app, "PATCH", &uri, Some(&user), Some(json!({ "name": 42 }))).await;
    assert_eq!(status, http::StatusCode::NOT_FOUND);
}
