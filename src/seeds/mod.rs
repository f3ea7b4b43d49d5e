//! Versioned, idempotent data seeds for local development.

mod demo_organization;

use async_trait::async_trait;
use sqlx::SqlitePool;

/// Outcome of running a seed. Skipped seeds are not recorded so they may run again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Seed executed (or found its data already present); record it.
    Applied,
    /// Seed opted out (e.g. env not set); do not record.
    Skipped,
}

/// A database seed. Seeds run in version order and are tracked for idempotency.
#[async_trait]
pub trait Seed: Send + Sync {
    /// Unique version identifier (timestamp format: YYYYMMDDHHMMSS).
    fn version(&self) -> i64;

    fn description(&self) -> &str;

    /// Execute the seed through the db layer.
    async fn run(&self, pool: &SqlitePool) -> Result<SeedOutcome, sqlx::Error>;
}

/// Re-run controls for the seed binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub force_all: bool,
    pub force_version: Option<i64>,
}

/// All seeds in execution order (sorted by version).
pub fn all_seeds() -> Vec<Box<dyn Seed>> {
    let mut seeds: Vec<Box<dyn Seed>> = vec![Box::new(demo_organization::DemoOrganization)];
    seeds.sort_by_key(|s| s.version());
    seeds
}

/// Run every pending seed, plus any forced ones.
pub async fn run_seeds(pool: &SqlitePool, options: RunOptions) -> Result<(), sqlx::Error> {
    ensure_seeds_table(pool).await?;
    let applied = applied_versions(pool).await?;

    for seed in all_seeds() {
        let version = seed.version();
        let description = seed.description();
        let already_applied = applied.contains(&version);
        let forced = options.force_all || options.force_version == Some(version);

        if already_applied && !forced {
            tracing::info!(description, "seed already applied, skipping");
            continue;
        }
        if already_applied {
            forget_seed(pool, version).await?;
        }

        match seed.run(pool).await? {
            SeedOutcome::Applied => {
                record_seed(pool, version, description).await?;
                tracing::info!(description, "seed applied");
            }
            SeedOutcome::Skipped => tracing::info!(description, "seed skipped (conditions not met)"),
        }
    }
    Ok(())
}

async fn ensure_seeds_table(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _orgspace_seeds (
            version INTEGER PRIMARY KEY NOT NULL,
            description TEXT NOT NULL,
            installed_on INTEGER NOT NULL DEFAULT (unixepoch())
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn applied_versions(pool: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT version FROM _orgspace_seeds")
        .fetch_all(pool)
        .await
}

async fn record_seed(pool: &SqlitePool, version: i64, description: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO _orgspace_seeds (version, description) VALUES (?, ?)")
        .bind(version)
        .bind(description)
        .execute(pool)
        .await?;
    Ok(())
}

async fn forget_seed(pool: &SqlitePool, version: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM _orgspace_seeds WHERE version = ?")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}
