//! Namespaced site-setting keys.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`SettingKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingKeyError {
    /// The key is empty.
    #[error("setting key cannot be empty")]
    Empty,
    /// The key is too long.
    #[error("setting key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The key has no namespace (e.g. `title` instead of `about.title`).
    #[error("setting key must be namespaced, e.g. `about.pageTitle`")]
    MissingNamespace,
    /// A segment is empty or contains a disallowed character.
    #[error("invalid setting key segment: {0:?}")]
    InvalidSegment(String),
}

/// A site-setting key such as `about.pageTitle`.
///
/// Keys are made of at least two dot-separated segments; each segment uses
/// ASCII letters, digits, `_` or `-`.
///
/// ```
/// use woodshop_core::SettingKey;
///
/// let key = SettingKey::parse("about.ourStoryBody").unwrap();
/// assert_eq!(key.namespace(), "about");
/// assert!(SettingKey::parse("about").is_err());
/// assert!(SettingKey::parse("about..title").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct SettingKey(String);

impl SettingKey {
    /// Maximum key length.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a setting key.
    ///
    /// # Errors
    ///
    /// Returns a [`SettingKeyError`] describing the first rule violated.
    pub fn parse(s: &str) -> Result<Self, SettingKeyError> {
        if s.is_empty() {
            return Err(SettingKeyError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SettingKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.contains('.') {
            return Err(SettingKeyError::MissingNamespace);
        }
        for segment in s.split('.') {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(SettingKeyError::InvalidSegment(segment.to_owned()));
            }
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first segment, e.g. `about` for `about.pageTitle`.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SettingKey {
    type Err = SettingKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SettingKey {
    type Error = SettingKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SettingKey> for String {
    fn from(key: SettingKey) -> Self {
        key.0
    }
}

impl AsRef<str> for SettingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
