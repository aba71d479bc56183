//! Site settings handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use woodshop_core::SettingKey;

use crate::content::snapshot;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Most keys one read may ask for.
const MAX_KEYS_PER_REQUEST: usize = 100;

/// Longest value a setting may hold, in characters.
pub const MAX_VALUE_CHARS: usize = 20_000;

/// Query for `GET /site-settings`.
#[derive(Debug, Deserialize)]
pub struct SettingsQuery {
    /// Comma-separated setting keys.
    pub keys: Option<String>,
}

/// Response for `GET /site-settings`.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: BTreeMap<SettingKey, Option<String>>,
}

/// Response for a successful `PATCH /site-settings`.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub ok: bool,
    pub key: SettingKey,
    pub value: Option<String>,
}

/// Parse the `keys` query parameter. Blank entries are ignored; duplicates
/// collapse.
fn parse_keys(raw: Option<&str>) -> Result<Vec<SettingKey>, AppError> {
    let raw = raw
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Missing keys parameter".to_string()))?;

    let mut keys = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let key = SettingKey::parse(part)
            .map_err(|e| AppError::Validation(format!("Invalid key {part:?}: {e}")))?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    if keys.is_empty() {
        return Err(AppError::Validation("Missing keys parameter".to_string()));
    }
    if keys.len() > MAX_KEYS_PER_REQUEST {
        return Err(AppError::Validation(format!(
            "At most {MAX_KEYS_PER_REQUEST} keys may be requested"
        )));
    }

    Ok(keys)
}

/// Read settings by key.
///
/// # Errors
///
/// Returns 400 for a missing or invalid key list and 500 if the query fails.
#[instrument(skip_all)]
pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingsQuery>,
) -> Result<Json<SettingsResponse>, AppError> {
    let keys = parse_keys(query.keys.as_deref())?;
    let rows = state.settings().get_many(&keys).await?;

    Ok(Json(SettingsResponse {
        settings: snapshot(&keys, rows),
    }))
}

/// Validated body of `PATCH /site-settings`.
#[derive(Debug, PartialEq, Eq)]
struct SettingUpdate {
    key: SettingKey,
    value: Option<String>,
}

fn parse_update(body: &[u8]) -> Result<SettingUpdate, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::Validation("Invalid JSON body".to_string()))?;

    let key = value
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("Missing or invalid key".to_string()))
        .and_then(|raw| {
            SettingKey::parse(raw)
                .map_err(|e| AppError::Validation(format!("Invalid key: {e}")))
        })?;

    let new_value = match value.get("value") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(AppError::Validation(
                "Value must be a string or null".to_string(),
            ));
        }
    };

    if new_value
        .as_deref()
        .is_some_and(|v| v.chars().count() > MAX_VALUE_CHARS)
    {
        return Err(AppError::Validation(format!(
            "Value must be at most {MAX_VALUE_CHARS} characters"
        )));
    }

    Ok(SettingUpdate {
        key,
        value: new_value,
    })
}

/// Write one setting. `null` clears the value.
///
/// # Errors
///
/// Returns 401/403 from the admin guard, 400 for an invalid body and 500 if
/// the write fails.
#[instrument(skip_all)]
pub async fn update_setting(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UpdateResponse>, AppError> {
    let update = parse_update(&body)?;

    let saved = state
        .settings()
        .upsert(&update.key, update.value.as_deref())
        .await?;

    tracing::info!(admin = %admin.email, key = %saved.key, "Updated site setting");

    Ok(Json(UpdateResponse {
        ok: true,
        key: saved.key,
        value: saved.value,
    }))
}
