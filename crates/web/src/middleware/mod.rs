//! HTTP middleware and extractors.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry (hub per request, transaction per route)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Admin checks run per handler through the [`RequireAdmin`] extractor.

pub mod auth;
pub mod session;

pub use auth::RequireAdmin;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
