//! Authentication and admin authorization.
//!
//! - `guard` - decides whether the current request comes from an admin
//! - `sign_in` - admits allow-listed Google accounts and flags them as admins

mod error;
pub mod guard;
pub mod sign_in;

pub use error::GuardError;
pub use guard::{AdminGuard, AdminIdentity, Decision, IdentityProvider, UserDirectory};
pub use sign_in::{DenialReason, SignInOutcome, SignInProfile, SignInService};

#[cfg(test)]
pub use guard::{MockIdentityProvider, MockUserDirectory};
