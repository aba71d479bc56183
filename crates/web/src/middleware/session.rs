//! Session middleware configuration.
//!
//! Sessions are stored server-side in `PostgreSQL`; the cookie only carries a
//! random session id.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::SiteConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "woodshop_session";

/// Session expiry after inactivity (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with the `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by migration.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &SiteConfig,
) -> SessionManagerLayer<PostgresStore> {
    session_layer(PostgresStore::new(pool.clone()), config.is_secure())
}

/// Session layer over any store.
///
/// `SameSite=Lax` so the cookie survives the top-level redirect back from
/// Google's consent screen.
#[must_use]
pub fn session_layer<S: SessionStore>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
