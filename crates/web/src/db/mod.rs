//! Database operations for the site `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Signed-in identities and their admin flag
//! - `site_settings` - Key/value content for editable page sections
//! - `projects` - Gallery projects, their tags, dates and display order
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p woodshop-cli -- migrate
//! ```

pub mod projects;
pub mod settings;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use projects::ProjectRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
