//! Identifiers for externally hosted images and the folders that group them.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`AssetId`] or [`FolderName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetIdError {
    /// The identifier is empty after trimming.
    #[error("identifier cannot be empty")]
    Empty,
    /// The identifier is too long.
    #[error("identifier must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The identifier contains a control character.
    #[error("identifier cannot contain control characters")]
    ControlCharacter,
}

const MAX_IDENTIFIER_LENGTH: usize = 255;

fn validate_identifier(raw: &str) -> Result<String, AssetIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AssetIdError::Empty);
    }
    if trimmed.len() > MAX_IDENTIFIER_LENGTH {
        return Err(AssetIdError::TooLong {
            max: MAX_IDENTIFIER_LENGTH,
        });
    }
    if trimmed.chars().any(char::is_control) {
        return Err(AssetIdError::ControlCharacter);
    }
    Ok(trimmed.to_owned())
}

/// Public identifier of a single hosted image (Cloudinary `public_id`).
///
/// ```
/// use woodshop_core::AssetId;
///
/// let id = AssetId::parse("  projects/walnut-table/IMG_0042 ").unwrap();
/// assert_eq!(id.as_str(), "projects/walnut-table/IMG_0042");
/// assert!(AssetId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    /// Parse an asset identifier, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetIdError`] if the identifier is blank, too long, or
    /// contains control characters.
    pub fn parse(raw: &str) -> Result<Self, AssetIdError> {
        validate_identifier(raw).map(Self)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AssetId {
    type Error = AssetIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

/// Full path of a remote asset folder, e.g. `projects/walnut-table`.
///
/// Project records store the same path in their `cloudinary_folder` column,
/// which lets the reconciler compare hosted folders against references with
/// plain set membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct FolderName(String);

impl FolderName {
    /// Parse a folder path, trimming surrounding whitespace and slashes.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetIdError`] if the path is blank, too long, or contains
    /// control characters.
    pub fn parse(raw: &str) -> Result<Self, AssetIdError> {
        let cleaned = validate_identifier(raw)?;
        let cleaned = cleaned.trim_matches('/');
        if cleaned.is_empty() {
            return Err(AssetIdError::Empty);
        }
        Ok(Self(cleaned.to_owned()))
    }

    /// Parse a folder reference and place it under `namespace` unless it is
    /// already there.
    ///
    /// `qualified("projects", "oak-bench")` and
    /// `qualified("projects", "projects/oak-bench")` both yield
    /// `projects/oak-bench`. The namespace itself stays `projects`.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetIdError`] if `raw` is not a valid folder path.
    pub fn qualified(namespace: &str, raw: &str) -> Result<Self, AssetIdError> {
        let folder = Self::parse(raw)?;
        let namespace = namespace.trim_matches('/');
        if namespace.is_empty() || folder.0 == namespace || folder.is_within(namespace) {
            return Ok(folder);
        }
        Self::parse(&format!("{namespace}/{}", folder.0))
    }

    /// Whether this folder lives directly or transitively under `namespace`.
    #[must_use]
    pub fn is_within(&self, namespace: &str) -> bool {
        self.0
            .strip_prefix(namespace.trim_matches('/'))
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FolderName {
    type Error = AssetIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FolderName> for String {
    fn from(folder: FolderName) -> Self {
        folder.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_trims() {
        let id = AssetId::parse(" hero/banner ").unwrap();
        assert_eq!(id.as_str(), "hero/banner");
    }

    #[test]
    fn test_asset_id_rejects_blank_and_control() {
        assert_eq!(AssetId::parse(""), Err(AssetIdError::Empty));
        assert_eq!(AssetId::parse(" \t "), Err(AssetIdError::Empty));
        assert_eq!(
            AssetId::parse("bad\u{0}id"),
            Err(AssetIdError::ControlCharacter)
        );
    }

    #[test]
    fn test_asset_id_too_long() {
        let raw = "x".repeat(256);
        assert!(matches!(
            AssetId::parse(&raw),
            Err(AssetIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_folder_strips_slashes() {
        let folder = FolderName::parse("/projects/oak-bench/").unwrap();
        assert_eq!(folder.as_str(), "projects/oak-bench");
        assert_eq!(FolderName::parse("///"), Err(AssetIdError::Empty));
    }

    #[test]
    fn test_folder_qualified() {
        let bare = FolderName::qualified("projects", "oak-bench").unwrap();
        let full = FolderName::qualified("projects", "projects/oak-bench").unwrap();
        assert_eq!(bare, full);
        assert_eq!(bare.as_str(), "projects/oak-bench");
    }

    #[test]
    fn test_folder_qualified_namespace_is_not_nested() {
        let folder = FolderName::qualified("projects", "projects").unwrap();
        assert_eq!(folder.as_str(), "projects");
        let folder = FolderName::qualified("/projects/", "/projects").unwrap();
        assert_eq!(folder.as_str(), "projects");
    }

    #[test]
    fn test_folder_is_within() {
        let folder = FolderName::parse("projects/oak-bench").unwrap();
        assert!(folder.is_within("projects"));
        assert!(folder.is_within("/projects/"));
        assert!(!folder.is_within("project"));
        assert!(!folder.is_within("projects/oak-bench"));
    }
}
