#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use http_body_util::BodyExt;
use orgspace::app::{
    self,
    cache::{InMemoryCache, ResponseCache},
    db,
    domain::{Email, OrganizationId, OrganizationRole, UserId},
    mail::RecordingMailer,
};
use orgspace::create_router;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower::ServiceExt;

pub async fn test_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Router plus handles to the collaborators tests want to inspect.
pub struct TestApp {
    pub router: axum::Router,
    pub pool: SqlitePool,
    pub mailer: Arc<RecordingMailer>,
}

pub fn test_app_with_cache(pool: SqlitePool, cache: Arc<dyn ResponseCache>) -> TestApp {
    let mailer = Arc::new(RecordingMailer::new());
    let state = app::AppState {
        db: pool.clone(),
        mail: mailer.clone(),
        config: app::config::Config::for_tests(),
        cache,
    };
    TestApp {
        router: create_router(state),
        pool,
        mailer,
    }
}

pub async fn test_app() -> TestApp {
    let cache = Arc::new(InMemoryCache::new(Duration::from_secs(60)));
    test_app_with_cache(test_pool().await, cache)
}

/// Insert a user row the way the upstream auth layer would.
pub async fn create_user(pool: &SqlitePool, email: &str) -> UserId {
    let id = UserId::new();
    let user = db::NewUser {
        id: id.clone(),
        email: Email::new(email).unwrap(),
        display_name: email.split('@').next().unwrap().to_string(),
    };
    db::users::insert(pool, &user).await.unwrap();
    id
}

pub async fn create_org(pool: &SqlitePool, slug: &str, owner: &UserId) -> OrganizationId {
    let id = OrganizationId::new();
    let org = db::organizations::NewOrganization {
        id: id.clone(),
        slug: slug.to_string(),
        name: slug.to_uppercase(),
    };
    db::organizations::insert(pool, &org).await.unwrap();
    db::organizations::add_member(pool, &id, owner, OrganizationRole::Owner)
        .await
        .unwrap();
    id
}

/// Create a user and add them to `org` with `role`.
pub async fn member_with_role(
    pool: &SqlitePool,
    org: &OrganizationId,
    email: &str,
    role: OrganizationRole,
) -> UserId {
    let user = create_user(pool, email).await;
    db::organizations::add_member(pool, org, &user, role).await.unwrap();
    user
}

pub async fn create_session(pool: &SqlitePool, user: &UserId, ttl: time::Duration) -> String {
    db::sessions::create(pool, user, OffsetDateTime::now_utc() + ttl)
        .await
        .unwrap()
}

/// Send a request as `user` (or anonymously) and decode the JSON response body.
pub async fn call(
    app: &TestApp,
    method: &str,
    uri: &str,
    user: Option<&UserId>,
    body: Option<serde_json::Value>,
) -> (http::StatusCode, serde_json::Value) {
    let mut builder = http::Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder
            .header("x-user-id", user.as_str())
            .header("x-session-id", "test-session");
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get(app: &TestApp, uri: &str, user: &UserId) -> (http::StatusCode, serde_json::Value) {
    call(app, "GET", uri, Some(user), None).await
}

pub async fn post(
    app: &TestApp,
    uri: &str,
    user: &UserId,
    body: serde_json::Value,
) -> (http::StatusCode, serde_json::Value) {
    call(app, "POST", uri, Some(user), Some(body)).await
}

pub async fn activity_count(pool: &SqlitePool, org: &OrganizationId) -> i64 {
    sqlx::query_scalar("SELECT count(*) FROM activities WHERE organization_id = ?")
        .bind(org.as_str())
        .fetch_one(pool)
        .await
        .unwrap()
}
