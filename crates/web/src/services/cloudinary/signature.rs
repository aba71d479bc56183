//! Signed upload parameters.
//!
//! Cloudinary verifies a direct browser upload by recomputing a digest of the
//! upload parameters plus the API secret.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::{Digest, Sha256};

use woodshop_core::FolderName;

/// Everything the browser needs to upload straight to Cloudinary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSignature {
    pub timestamp: i64,
    pub signature: String,
    pub api_key: String,
    pub cloud_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<FolderName>,
}

/// Sign upload parameters.
///
/// Parameters are sorted by name, joined as `k=v` pairs with `&`, suffixed
/// with the secret and hashed with SHA-256.
#[must_use]
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &SecretString) -> String {
    let joined = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

/// Build a signature for an upload at `timestamp`, optionally into `folder`.
#[must_use]
pub fn upload_signature(
    cloud_name: &str,
    api_key: &str,
    api_secret: &SecretString,
    folder: Option<FolderName>,
    timestamp: i64,
) -> UploadSignature {
    let mut params = BTreeMap::new();
    params.insert("timestamp", timestamp.to_string());
    if let Some(folder) = &folder {
        params.insert("folder", folder.as_str().to_owned());
    }

    UploadSignature {
        timestamp,
        signature: sign_params(&params, api_secret),
        api_key: api_key.to_owned(),
        cloud_name: cloud_name.to_owned(),
        folder,
    }
}
