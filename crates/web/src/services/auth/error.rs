//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while resolving or authorizing an identity.
///
/// A guard never turns these into a `Decision`; they surface as 500s.
#[derive(Debug, Error)]
pub enum GuardError {
    /// The session store could not be read.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The user lookup failed.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}
