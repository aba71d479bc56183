//! Page content handlers (public).

use axum::{Json, extract::State};

use crate::content::{
    ABOUT_KEYS, AboutContent, HOME_KEYS, HomeContent, SettingsSnapshot, section_keys, snapshot,
};
use crate::error::AppError;
use crate::state::AppState;

async fn load_section(state: &AppState, raw_keys: &[&str]) -> Result<SettingsSnapshot, AppError> {
    let keys = section_keys(raw_keys);
    let rows = state.settings().get_many(&keys).await?;
    Ok(snapshot(&keys, rows))
}

/// About page sections.
///
/// # Errors
///
/// Returns 500 if the settings query fails.
pub async fn about(State(state): State<AppState>) -> Result<Json<AboutContent>, AppError> {
    let snap = load_section(&state, &ABOUT_KEYS).await?;
    Ok(Json(AboutContent::from_snapshot(&snap)))
}

/// Home page hero.
///
/// # Errors
///
/// Returns 500 if the settings query fails.
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeContent>, AppError> {
    let snap = load_section(&state, &HOME_KEYS).await?;
    Ok(Json(HomeContent::from_snapshot(&snap)))
}
