//! Authentication extractors.
//!
//! [`RequireAdmin`] runs the admin guard for a handler and rejects with the
//! JSON 401/403 bodies.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::services::auth::{AdminGuard, AdminIdentity, Decision};
use crate::state::AppState;

/// Extractor that requires an admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email)
/// }
/// ```
pub struct RequireAdmin(pub AdminIdentity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer; absent only if the layer is missing
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::Unauthenticated)?;

        match AdminGuard::new(state.users()).authorize(&session).await? {
            Decision::Authorized(admin) => {
                set_sentry_user(&admin);
                Ok(Self(admin))
            }
            Decision::Unauthenticated => Err(AppError::Unauthenticated),
            Decision::Forbidden => {
                tracing::warn!(path = %parts.uri.path(), "Non-admin denied");
                Err(AppError::Forbidden)
            }
        }
    }
}

/// Set the Sentry user context for the current request.
fn set_sentry_user(admin: &AdminIdentity) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin.user_id.to_string()),
            email: Some(admin.email.to_string()),
            ..Default::default()
        }));
    });
}
