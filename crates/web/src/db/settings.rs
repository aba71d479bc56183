//! Site settings database operations.
//!
//! One row per key; writes are last-write-wins upserts with no history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use woodshop_core::SettingKey;

use super::RepositoryError;
use crate::content::SettingsStore;
use crate::models::SiteSetting;

#[derive(Debug, sqlx::FromRow)]
struct SiteSettingRow {
    key: String,
    value: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SiteSettingRow> for SiteSetting {
    type Error = RepositoryError;

    fn try_from(row: SiteSettingRow) -> Result<Self, Self::Error> {
        let key = SettingKey::parse(&row.key).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid setting key {:?}: {e}", row.key))
        })?;
        Ok(Self {
            key,
            value: row.value,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for site settings.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get_many(&self, keys: &[SettingKey]) -> Result<Vec<SiteSetting>, RepositoryError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = keys.iter().map(|k| k.as_str().to_owned()).collect();

        let rows = sqlx::query_as::<_, SiteSettingRow>(
            "SELECT key, value, updated_at FROM site_settings WHERE key = ANY($1) ORDER BY key",
        )
        .bind(&keys)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn upsert(
        &self,
        key: &SettingKey,
        value: Option<&str>,
    ) -> Result<SiteSetting, RepositoryError> {
        let row = sqlx::query_as::<_, SiteSettingRow>(
            r"
            INSERT INTO site_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            RETURNING key, value, updated_at
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_row_with_invalid_key_is_corruption() {
        let row = SiteSettingRow {
            key: "no-namespace".to_string(),
            value: Some("x".to_string()),
            updated_at: Utc::now(),
        };
        let result: Result<SiteSetting, _> = row.try_into();
        assert!(matches!(result, Err(RepositoryError::DataCorruption(_))));
    }

    #[test]
    fn test_row_converts() {
        let row = SiteSettingRow {
            key: "home.heroTitle".to_string(),
            value: None,
            updated_at: Utc::now(),
        };
        let setting: SiteSetting = row.try_into().unwrap();
        assert_eq!(setting.key.as_str(), "home.heroTitle");
        assert_eq!(setting.value, None);
    }
}
