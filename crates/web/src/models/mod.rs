//! Domain models for the site backend.

pub mod project;
pub mod session;
pub mod setting;
pub mod user;

pub use project::{Project, ProjectView};
pub use session::{SessionIdentity, keys as session_keys};
pub use setting::SiteSetting;
pub use user::{AdminFlag, User};
