//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! ws-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/web/migrations/`, embedded at compile time.

use thiserror::Error;
use woodshop_web::config::{ConfigError, database_url_from_env};
use woodshop_web::db::create_pool;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
