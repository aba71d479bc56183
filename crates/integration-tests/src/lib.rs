//! Integration test helpers for the Woodshop web server.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! ws-cli migrate
//!
//! # Start the server
//! cargo run -p woodshop-web
//!
//! # Run the ignored tests against it
//! cargo test -p woodshop-integration-tests -- --ignored
//! ```
//!
//! `WOODSHOP_BASE_URL` points the tests at another server and
//! `TEST_DATABASE_URL` at another database.

use reqwest::Client;
use sqlx::PgPool;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("WOODSHOP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// HTTP client that keeps cookies between requests, like a browser.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn client() -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Connect to the database the server under test uses.
///
/// # Errors
///
/// Returns an error if neither `TEST_DATABASE_URL` nor `DATABASE_URL` is set
/// or the connection fails.
pub async fn connect_db() -> Result<PgPool, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let url = std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))?;
    Ok(PgPool::connect(&url).await?)
}
