//! Admin user management commands.
//!
//! Admins are normally created by signing in with an allow-listed Google
//! account. These commands fix things up by hand.
//!
//! # Usage
//!
//! ```bash
//! ws-cli admin grant owner@woodshop.com
//! ws-cli admin revoke former@woodshop.com
//! ws-cli admin list
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use sqlx::PgPool;
use thiserror::Error;
use woodshop_core::Email;
use woodshop_web::config::{ConfigError, database_url_from_env};
use woodshop_web::db::{RepositoryError, UserRepository, create_pool};
use woodshop_web::services::auth::SignInProfile;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No user with that email.
    #[error("No user with email: {0}")]
    UnknownUser(String),
}

fn parse_email(raw: &str) -> Result<Email, AdminError> {
    Email::parse(raw).map_err(|_| AdminError::InvalidEmail(raw.to_owned()))
}

async fn connect() -> Result<PgPool, AdminError> {
    let database_url = database_url_from_env()?;
    tracing::info!("Connecting to database...");
    Ok(create_pool(&database_url).await?)
}

/// Flag a user as admin, creating the row if they have never signed in.
///
/// Sign-in still requires the email to be in `AUTHORIZED_ADMIN_EMAIL`.
///
/// # Errors
///
/// Returns `AdminError` if the email is invalid or the write fails.
pub async fn grant(email: &str) -> Result<(), AdminError> {
    let email = parse_email(email)?;
    let users = UserRepository::new(connect().await?);

    let user = users
        .upsert_admin(&SignInProfile {
            email,
            email_verified: true,
            name: None,
            image: None,
        })
        .await?;

    tracing::info!("Admin granted: {} (id {})", user.email, user.id);
    Ok(())
}

/// Clear a user's admin flag. Takes effect on their next request.
///
/// # Errors
///
/// Returns `AdminError::UnknownUser` if no user has that email.
pub async fn revoke(email: &str) -> Result<(), AdminError> {
    let email = parse_email(email)?;
    let users = UserRepository::new(connect().await?);

    match users.revoke_admin(&email).await {
        Ok(()) => {
            tracing::info!("Admin revoked: {}", email);
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(AdminError::UnknownUser(email.into_inner())),
        Err(e) => Err(e.into()),
    }
}

/// Log every admin.
///
/// # Errors
///
/// Returns `AdminError` if the query fails.
pub async fn list() -> Result<(), AdminError> {
    let users = UserRepository::new(connect().await?);
    let admins = users.list_admins().await?;

    if admins.is_empty() {
        tracing::info!("No admins");
    }
    for admin in admins {
        tracing::info!(
            "{} ({}) since {}",
            admin.email,
            admin.name.as_deref().unwrap_or("no name"),
            admin.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
