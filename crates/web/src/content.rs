//! Typed views of the editable page sections.
//!
//! Each section is a fixed set of setting keys. Missing rows and cleared
//! values both read as `None`; the front-end falls back to its defaults.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use woodshop_core::SettingKey;

use crate::db::RepositoryError;
use crate::models::SiteSetting;

/// Persisted key/value settings. Writes are last-write-wins.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Every stored setting among `keys`. Keys without a row are absent from
    /// the result.
    async fn get_many(&self, keys: &[SettingKey]) -> Result<Vec<SiteSetting>, RepositoryError>;

    /// Insert or overwrite one setting; `None` clears its value.
    async fn upsert(
        &self,
        key: &SettingKey,
        value: Option<&str>,
    ) -> Result<SiteSetting, RepositoryError>;
}

/// Keys read by the About page.
pub const ABOUT_KEYS: [&str; 5] = [
    "about.pageTitle",
    "about.pageTagline",
    "about.ourStoryHeading",
    "about.ourStoryBody",
    "about.whatWeDo",
];

/// Keys read by the home page hero.
pub const HOME_KEYS: [&str; 3] = ["home.heroTitle", "home.heroTagline", "home.heroImage"];

/// Requested keys mapped to their stored value; keys without a row map to
/// `None`.
pub type SettingsSnapshot = BTreeMap<SettingKey, Option<String>>;

/// Build a snapshot in which every requested key is present.
#[must_use]
pub fn snapshot(keys: &[SettingKey], rows: Vec<SiteSetting>) -> SettingsSnapshot {
    let mut map: SettingsSnapshot = keys.iter().map(|k| (k.clone(), None)).collect();
    for row in rows {
        if let Some(slot) = map.get_mut(&row.key) {
            *slot = row.value;
        }
    }
    map
}

/// Parse a fixed key list. The lists above are valid by construction.
#[must_use]
pub fn section_keys(raw: &[&str]) -> Vec<SettingKey> {
    raw.iter().filter_map(|k| SettingKey::parse(k).ok()).collect()
}

fn value_of(snapshot: &SettingsSnapshot, key: &str) -> Option<String> {
    snapshot
        .iter()
        .find(|(k, _)| k.as_str() == key)
        .and_then(|(_, v)| v.clone())
}

/// One card in the "What We Do" grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCard {
    pub title: String,
    pub description: String,
}

/// The "What We Do" section, stored as one JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatWeDo {
    pub heading: String,
    pub cards: Vec<ServiceCard>,
}

impl WhatWeDo {
    /// Parse the stored JSON leniently.
    ///
    /// Returns `None` for blank or malformed JSON, or when `heading` is not a
    /// string or `cards` is not an array. Cards whose `title` or
    /// `description` is not a string are dropped.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        let raw = raw.filter(|r| !r.is_empty())?;
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;

        let heading = value.get("heading")?.as_str()?.to_owned();
        let cards = value
            .get("cards")?
            .as_array()?
            .iter()
            .filter_map(|card| {
                Some(ServiceCard {
                    title: card.get("title")?.as_str()?.to_owned(),
                    description: card.get("description")?.as_str()?.to_owned(),
                })
            })
            .collect();

        Some(Self { heading, cards })
    }
}

/// About page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutContent {
    pub page_title: Option<String>,
    pub page_tagline: Option<String>,
    pub our_story_heading: Option<String>,
    pub our_story_body: Option<String>,
    pub what_we_do: Option<WhatWeDo>,
}

impl AboutContent {
    /// Hydrate from a snapshot of [`ABOUT_KEYS`].
    #[must_use]
    pub fn from_snapshot(snapshot: &SettingsSnapshot) -> Self {
        Self {
            page_title: value_of(snapshot, "about.pageTitle"),
            page_tagline: value_of(snapshot, "about.pageTagline"),
            our_story_heading: value_of(snapshot, "about.ourStoryHeading"),
            our_story_body: value_of(snapshot, "about.ourStoryBody"),
            what_we_do: WhatWeDo::parse(value_of(snapshot, "about.whatWeDo").as_deref()),
        }
    }
}

/// Home page hero content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeContent {
    pub hero_title: Option<String>,
    pub hero_tagline: Option<String>,
    pub hero_image: Option<String>,
}

impl HomeContent {
    /// Hydrate from a snapshot of [`HOME_KEYS`].
    #[must_use]
    pub fn from_snapshot(snapshot: &SettingsSnapshot) -> Self {
        Self {
            hero_title: value_of(snapshot, "home.heroTitle"),
            hero_tagline: value_of(snapshot, "home.heroTagline"),
            hero_image: value_of(snapshot, "home.heroImage"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn row(key: &str, value: Option<&str>) -> SiteSetting {
        SiteSetting {
            key: SettingKey::parse(key).unwrap(),
            value: value.map(str::to_owned),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_section_keys_are_valid() {
        assert_eq!(section_keys(&ABOUT_KEYS).len(), ABOUT_KEYS.len());
        assert_eq!(section_keys(&HOME_KEYS).len(), HOME_KEYS.len());
    }

    #[test]
    fn test_snapshot_includes_missing_keys() {
        let keys = section_keys(&HOME_KEYS);
        let snap = snapshot(&keys, vec![row("home.heroTitle", Some("Built by hand"))]);

        assert_eq!(snap.len(), 3);
        assert_eq!(value_of(&snap, "home.heroTitle").as_deref(), Some("Built by hand"));
        assert_eq!(value_of(&snap, "home.heroImage"), None);
    }

    #[test]
    fn test_snapshot_ignores_unrequested_rows() {
        let keys = section_keys(&["home.heroTitle"]);
        let snap = snapshot(&keys, vec![row("about.pageTitle", Some("About"))]);
        assert_eq!(snap.len(), 1);
    }

    #[test]
    fn test_what_we_do_valid() {
        let parsed = WhatWeDo::parse(Some(
            r#"{"heading":"What We Do","cards":[{"title":"Tables","description":"Solid hardwood."}]}"#,
        ))
        .unwrap();
        assert_eq!(parsed.heading, "What We Do");
        assert_eq!(parsed.cards.len(), 1);
    }

    #[test]
    fn test_what_we_do_drops_bad_cards() {
        let parsed = WhatWeDo::parse(Some(
            r#"{"heading":"Services","cards":[
                {"title":"Cabinets","description":"Custom built."},
                {"title":42,"description":"not a string title"},
                {"title":"No description"},
                null
            ]}"#,
        ))
        .unwrap();
        assert_eq!(
            parsed.cards,
            vec![ServiceCard {
                title: "Cabinets".to_string(),
                description: "Custom built.".to_string(),
            }]
        );
    }

    #[test]
    fn test_what_we_do_invalid() {
        assert_eq!(WhatWeDo::parse(None), None);
        assert_eq!(WhatWeDo::parse(Some("")), None);
        assert_eq!(WhatWeDo::parse(Some("{not json")), None);
        assert_eq!(WhatWeDo::parse(Some(r#"{"heading":7,"cards":[]}"#)), None);
        assert_eq!(WhatWeDo::parse(Some(r#"{"heading":"x","cards":{}}"#)), None);
    }

    #[test]
    fn test_about_from_snapshot() {
        let keys = section_keys(&ABOUT_KEYS);
        let snap = snapshot(
            &keys,
            vec![
                row("about.pageTitle", Some("About Us")),
                row("about.ourStoryBody", None),
                row("about.whatWeDo", Some("garbage")),
            ],
        );

        let about = AboutContent::from_snapshot(&snap);
        assert_eq!(about.page_title.as_deref(), Some("About Us"));
        assert_eq!(about.our_story_body, None);
        assert_eq!(about.what_we_do, None);

        let json = serde_json::to_value(&about).unwrap();
        assert_eq!(json["pageTitle"], "About Us");
        assert!(json["whatWeDo"].is_null());
    }
}
