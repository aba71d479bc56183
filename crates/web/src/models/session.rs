//! Session-related types for authentication.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use woodshop_core::{Email, UserId};

/// Session-stored identity written at sign-in.
///
/// Both identifying fields are optional so that a session written by an older
/// deploy (email only) still resolves; the guard falls back to the email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// User's database ID.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// User's email address.
    #[serde(default)]
    pub email: Option<Email>,
    /// Display name reported by Google.
    #[serde(default)]
    pub name: Option<String>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in identity.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the Google OAuth state parameter (CSRF).
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";
}
