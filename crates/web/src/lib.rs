//! Woodshop web library.
//!
//! JSON backend for the Woodshop marketing site: editable content settings,
//! the project gallery, Google sign-in for admins, Cloudinary upload signing
//! and orphaned folder cleanup, and contact form relay. Exposed as a library
//! so the CLI and tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
