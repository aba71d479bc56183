//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Admin authorization guard and sign-in admission
//! - `cloudinary` - Cloudinary Admin API client and upload signing
//! - `google` - Google OAuth client
//! - `projects` - Gallery filters, pagination, edits and reordering
//! - `reconciler` - Orphaned project folder cleanup
//! - `web3forms` - Contact form delivery

pub mod auth;
pub mod cloudinary;
pub mod google;
pub mod projects;
pub mod reconciler;
pub mod web3forms;

pub use auth::{AdminGuard, Decision, GuardError, SignInOutcome, SignInService};
pub use cloudinary::{AssetHost, AssetHostError, CloudinaryClient};
pub use google::{GoogleError, GoogleOAuthClient};
pub use reconciler::{OrphanReconciler, ProjectFolderSource, ReconcileError};
pub use web3forms::{ContactMessage, Web3FormsClient, Web3FormsError};
