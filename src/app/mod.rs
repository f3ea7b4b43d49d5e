use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

/// Human-readable application name, used in email copy.
pub const APP_NAME: &str = "Orgspace";

/// Shared state available to all handlers via Axum's state extractor.
///
/// Collaborators with more than one implementation (mail, cache) are trait
/// objects so tests and deployments can swap them.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub mail: Arc<dyn mail::EmailSender>,
    pub config: config::Config,
    pub cache: Arc<dyn cache::ResponseCache>,
}

/// All API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(features::organizations::routes())
        .merge(features::members::routes())
        .merge(features::workspaces::routes())
        .merge(features::activity::routes())
        .merge(features::metrics::routes())
}

pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod features;
pub mod mail;
pub mod permissions;
pub mod session;
pub mod single_writer;
pub mod tenant;
