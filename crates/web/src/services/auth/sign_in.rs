//! Sign-in admission.
//!
//! Only allow-listed Google accounts may sign in at all; those that do are
//! flagged as admins in the database. The allow-list is handed in at
//! construction and never read from the environment here.

use serde::{Deserialize, Serialize};

use woodshop_core::{AdminAllowList, Email};

use super::guard::UserDirectory;
use crate::db::RepositoryError;
use crate::models::{SessionIdentity, User};

/// Profile reported by the identity provider after a successful OAuth flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInProfile {
    pub email: Email,
    pub email_verified: bool,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Why a sign-in was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No admin emails are configured, so nobody can sign in.
    EmptyAllowList,
    /// The email is not on the allow-list.
    NotAllowListed,
    /// Google has not verified the email address.
    UnverifiedEmail,
}

/// Result of completing a sign-in.
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    /// Admitted: the user row was written and this identity goes in the session.
    Admitted {
        user: User,
        identity: SessionIdentity,
    },
    /// Refused: nothing was written.
    Denied(DenialReason),
}

/// Decides who may sign in and records admitted users.
pub struct SignInService<'a> {
    allow_list: &'a AdminAllowList,
    users: &'a dyn UserDirectory,
}

impl<'a> SignInService<'a> {
    /// Create a sign-in service.
    #[must_use]
    pub const fn new(allow_list: &'a AdminAllowList, users: &'a dyn UserDirectory) -> Self {
        Self { allow_list, users }
    }

    /// Check the allow-list without touching storage.
    ///
    /// # Errors
    ///
    /// Returns the `DenialReason` when the profile may not sign in.
    pub fn admission(&self, profile: &SignInProfile) -> Result<(), DenialReason> {
        if self.allow_list.is_empty() {
            return Err(DenialReason::EmptyAllowList);
        }
        if !self.allow_list.contains(&profile.email) {
            return Err(DenialReason::NotAllowListed);
        }
        if !profile.email_verified {
            return Err(DenialReason::UnverifiedEmail);
        }
        Ok(())
    }

    /// Admit or refuse `profile`. Admitted users are upserted with the admin
    /// flag set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the user cannot be written.
    pub async fn complete(&self, profile: &SignInProfile) -> Result<SignInOutcome, RepositoryError> {
        if let Err(reason) = self.admission(profile) {
            tracing::warn!(email = %profile.email, ?reason, "Sign-in denied");
            return Ok(SignInOutcome::Denied(reason));
        }

        let user = self.users.record_admin_sign_in(profile).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "Admin signed in");

        let identity = SessionIdentity {
            user_id: Some(user.id),
            email: Some(user.email.clone()),
            name: user.name.clone(),
        };
        Ok(SignInOutcome::Admitted { user, identity })
    }
}
