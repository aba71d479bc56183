//! Admin authorization guard.
//!
//! The guard reads the signed-in identity from the session, looks the user up
//! in the database and decides. It never writes and never retries.

use async_trait::async_trait;
use serde::Serialize;
use tower_sessions::Session;

use woodshop_core::{Email, UserId};

use super::GuardError;
use super::sign_in::SignInProfile;
use crate::db::RepositoryError;
use crate::models::{AdminFlag, SessionIdentity, User, session_keys};

/// Resolves the identity attached to the current request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when nobody is signed in. A store failure is an error, not
    /// an anonymous request.
    async fn current_identity(&self) -> Result<Option<SessionIdentity>, GuardError>;
}

#[async_trait]
impl IdentityProvider for Session {
    async fn current_identity(&self) -> Result<Option<SessionIdentity>, GuardError> {
        Ok(self.get(session_keys::CURRENT_USER).await?)
    }
}

/// Persisted user lookups needed by authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Admin flag of the user with this id.
    async fn find_admin_flag_by_id(&self, id: UserId)
    -> Result<Option<AdminFlag>, RepositoryError>;

    /// Admin flag of the user with this email.
    async fn find_admin_flag_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminFlag>, RepositoryError>;

    /// Create or update the user for an admitted sign-in and flag them admin.
    async fn record_admin_sign_in(&self, profile: &SignInProfile)
    -> Result<User, RepositoryError>;
}

/// Who an authorized request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub user_id: UserId,
    pub email: Email,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Signed in and flagged as admin.
    Authorized(AdminIdentity),
    /// No signed-in identity (HTTP 401).
    Unauthenticated,
    /// Signed in, but the user is missing or not an admin (HTTP 403).
    Forbidden,
}

impl Decision {
    /// Whether this decision grants admin access.
    #[must_use]
    pub const fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Admin authorization guard over a user directory.
pub struct AdminGuard<'a> {
    users: &'a dyn UserDirectory,
}

impl<'a> AdminGuard<'a> {
    /// Create a guard that reads admin flags from `users`.
    #[must_use]
    pub const fn new(users: &'a dyn UserDirectory) -> Self {
        Self { users }
    }

    /// Decide whether the identity behind `provider` is an admin.
    ///
    /// The user is looked up by id when the session carries one, otherwise by
    /// email. A session with neither is forbidden.
    ///
    /// # Errors
    ///
    /// Returns `GuardError` if the session or the user lookup fails.
    pub async fn authorize(&self, provider: &dyn IdentityProvider) -> Result<Decision, GuardError> {
        let Some(identity) = provider.current_identity().await? else {
            return Ok(Decision::Unauthenticated);
        };

        let flag = if let Some(user_id) = identity.user_id {
            self.users.find_admin_flag_by_id(user_id).await?
        } else if let Some(email) = identity.email.as_ref() {
            self.users.find_admin_flag_by_email(email).await?
        } else {
            tracing::warn!("Session identity has neither user id nor email");
            return Ok(Decision::Forbidden);
        };

        Ok(match flag {
            Some(flag) if flag.is_admin => Decision::Authorized(AdminIdentity {
                user_id: flag.user_id,
                email: flag.email,
            }),
            _ => Decision::Forbidden,
        })
    }
}
