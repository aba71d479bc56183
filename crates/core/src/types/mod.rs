//! Core types for Woodshop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod allow_list;
pub mod asset;
pub mod email;
pub mod id;
pub mod setting_key;

pub use allow_list::AdminAllowList;
pub use asset::{AssetId, AssetIdError, FolderName};
pub use email::{Email, EmailError};
pub use id::*;
pub use setting_key::{SettingKey, SettingKeyError};
