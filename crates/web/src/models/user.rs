//! Persisted user records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use woodshop_core::{Email, UserId};

/// A person who has signed in with Google at least once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: Option<String>,
    pub image: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The slice of a user row the admin guard reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminFlag {
    pub user_id: UserId,
    pub email: Email,
    pub is_admin: bool,
}
