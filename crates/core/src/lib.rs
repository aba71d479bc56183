//! Woodshop Core - Shared types library.
//!
//! This crate provides common types used across all Woodshop components:
//! - `web` - Public site API with admin-only inline editing
//! - `cli` - Command-line tools for migrations, admin grants and cleanup
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Validated newtypes for IDs, emails, setting keys, asset
//!   identifiers and the admin allow-list

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
