//! Key/value site settings.

use chrono::{DateTime, Utc};
use serde::Serialize;

use woodshop_core::SettingKey;

/// One editable piece of site content. `None` means the admin cleared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSetting {
    pub key: SettingKey,
    pub value: Option<String>,
    pub updated_at: DateTime<Utc>,
}
