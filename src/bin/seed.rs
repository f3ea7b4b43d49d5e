use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use orgspace::{app, seeds};
use sqlx::sqlite::SqlitePoolOptions;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = app::config::Config::from_env()
        .expect("Failed to load config (check DATABASE_URL and other env vars)");

    let _db_lock = match app::single_writer::acquire(&config.database_url) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let args: Vec<String> = env::args().collect();
    let options = seeds::RunOptions {
        force_all: args.iter().any(|a| a == "--force-all"),
        force_version: args
            .iter()
            .position(|a| a == "--force")
            .and_then(|i| args.get(i + 1))
            .and_then(|s| s.parse::<i64>().ok()),
    };

    if let Err(e) = seeds::run_seeds(&pool, options).await {
        eprintln!("Seeding failed: {}", e);
        std::process::exit(1);
    }
}
