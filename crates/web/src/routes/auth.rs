//! Google sign-in route handlers.
//!
//! Handles the admin OAuth flow:
//! - Login: redirect to Google's consent screen
//! - Callback: verify state, fetch the profile, admit allow-listed emails
//! - Logout: flush the session
//! - Session: report who is signed in and whether they are an admin

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use woodshop_core::{Email, UserId};

use crate::error::AppError;
use crate::models::session_keys;
use crate::services::auth::{AdminGuard, IdentityProvider, SignInOutcome, SignInService};
use crate::state::AppState;

/// Query parameters from the Google OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Signed-in user as reported to the front-end.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: Option<UserId>,
    pub email: Option<Email>,
    pub name: Option<String>,
    pub is_admin: bool,
}

/// Response for `GET /auth/session`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}

fn error_redirect(code: &str) -> Response {
    Redirect::to(&format!("/admin/error?error={code}")).into_response()
}

/// Generate a random alphanumeric string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

/// Start Google sign-in.
///
/// # Route
///
/// `GET /auth/google/login`
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = generate_random_string(32);

    if let Err(e) = session
        .insert(session_keys::GOOGLE_OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return error_redirect("Configuration");
    }

    let auth_url = state
        .google()
        .authorization_url(&state.config().google_redirect_uri(), &oauth_state);

    Redirect::to(&auth_url).into_response()
}

/// Finish Google sign-in.
///
/// Only allow-listed, verified emails are admitted; they are recorded as
/// admins and the session id is cycled before the identity is stored.
///
/// # Route
///
/// `GET /auth/google/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("Google OAuth error: {} - {}", error, description);
        return error_redirect("OAuthSignin");
    }

    let Some(code) = query.code else {
        tracing::warn!("Google OAuth callback missing code");
        return error_redirect("OAuthCallback");
    };

    let stored_state: Option<String> = session
        .get(session_keys::GOOGLE_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.is_none() || stored_state != query.state {
        tracing::warn!("Google OAuth state mismatch");
        return error_redirect("OAuthCallback");
    }

    // One-time use
    if let Err(e) = session
        .remove::<String>(session_keys::GOOGLE_OAUTH_STATE)
        .await
    {
        tracing::warn!("Failed to clear OAuth state from session: {}", e);
    }

    let profile = match state
        .google()
        .fetch_profile(&code, &state.config().google_redirect_uri())
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!("Failed to complete Google OAuth exchange: {}", e);
            return error_redirect("OAuthCallback");
        }
    };

    let outcome = SignInService::new(&state.config().admin_allow_list, state.users())
        .complete(&profile)
        .await;

    let identity = match outcome {
        Ok(SignInOutcome::Admitted { identity, .. }) => identity,
        Ok(SignInOutcome::Denied(_)) => return error_redirect("AccessDenied"),
        Err(e) => {
            tracing::error!("Failed to record sign-in: {}", e);
            return error_redirect("Callback");
        }
    };

    if let Err(e) = session.cycle_id().await {
        tracing::error!("Failed to cycle session id: {}", e);
        return error_redirect("Callback");
    }

    if let Err(e) = session.insert(session_keys::CURRENT_USER, &identity).await {
        tracing::error!("Failed to store identity in session: {}", e);
        return error_redirect("Callback");
    }

    Redirect::to("/").into_response()
}

/// Sign out.
///
/// # Route
///
/// `POST /auth/logout`
pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    Redirect::to("/").into_response()
}

/// Report the signed-in user.
///
/// # Route
///
/// `GET /auth/session`
///
/// # Errors
///
/// Returns 500 if the session or the user lookup fails.
pub async fn session(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<SessionResponse>, AppError> {
    let Some(identity) = session.current_identity().await? else {
        return Ok(Json(SessionResponse { user: None }));
    };

    let decision = AdminGuard::new(state.users()).authorize(&session).await?;

    Ok(Json(SessionResponse {
        user: Some(SessionUser {
            id: identity.user_id,
            email: identity.email,
            name: identity.name,
            is_admin: decision.is_authorized(),
        }),
    }))
}
