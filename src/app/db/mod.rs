//! Data access. Free functions over any `SqliteExecutor` so callers can pass a
//! pool or a transaction.

pub mod activities;
pub mod organizations;
pub mod sessions;
pub mod users;
pub mod workspaces;

pub use users::{NewUser, User};
