//! Command implementations.

pub mod admin;
pub mod cleanup;
pub mod migrate;
