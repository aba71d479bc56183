//! Cloudinary Admin API client.
//!
//! Only the calls the site needs: list project folders, find a folder's
//! oldest image, delete a folder with its images, delete one image, and sign
//! direct browser uploads.
//!
//! # Authentication
//!
//! Every Admin API call uses HTTP basic auth with `api_key:api_secret`.

pub mod signature;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use woodshop_core::{AssetId, FolderName};

use crate::config::CloudinaryConfig;
pub use signature::{UploadSignature, sign_params, upload_signature};
use types::{DeleteResourcesResponse, ErrorResponse, FolderListResponse, SearchResponse};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Page size for folder listings (API maximum).
const FOLDER_PAGE_SIZE: &str = "500";

/// Upper bound on prefix-delete rounds for one folder. Each round removes up
/// to 1000 images.
const MAX_PREFIX_DELETE_ROUNDS: usize = 20;

/// Errors that can occur when talking to the asset host.
#[derive(Debug, Error)]
pub enum AssetHostError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The asset does not exist.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Failed to parse a response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Remote image host operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Every folder directly under `namespace`, in host order.
    async fn list_folders(&self, namespace: &str) -> Result<Vec<FolderName>, AssetHostError>;

    /// Upload time of the oldest image in `folder`, `None` when it is empty.
    async fn oldest_asset_created_at(
        &self,
        folder: &FolderName,
    ) -> Result<Option<DateTime<Utc>>, AssetHostError>;

    /// Delete every image under `folder`, then the folder itself. Deleting a
    /// folder that is already gone succeeds.
    async fn delete_folder(&self, folder: &FolderName) -> Result<(), AssetHostError>;

    /// Delete a single image.
    async fn delete_asset(&self, asset_id: &AssetId) -> Result<(), AssetHostError>;
}

/// Cloudinary client.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("api_base", &self.api_base)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .finish_non_exhaustive()
    }
}

impl CloudinaryClient {
    /// Create a new client for the public Cloudinary API.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self::with_base_url(config, API_BASE)
    }

    /// Create a client that talks to `api_base` instead of Cloudinary.
    #[must_use]
    pub fn with_base_url(config: &CloudinaryConfig, api_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_owned(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    /// Sign a direct upload, optionally into `folder`.
    #[must_use]
    pub fn sign_upload(&self, folder: Option<FolderName>, timestamp: i64) -> UploadSignature {
        upload_signature(
            &self.cloud_name,
            &self.api_key,
            &self.api_secret,
            folder,
            timestamp,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.api_base, self.cloud_name)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .basic_auth(&self.api_key, Some(self.api_secret.expose_secret()))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .basic_auth(&self.api_key, Some(self.api_secret.expose_secret()))
    }

    fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .basic_auth(&self.api_key, Some(self.api_secret.expose_secret()))
    }

    async fn delete_resources_by_prefix(&self, folder: &FolderName) -> Result<(), AssetHostError> {
        let prefix = format!("{}/", folder.as_str());

        for _ in 0..MAX_PREFIX_DELETE_ROUNDS {
            let response = self
                .delete("resources/image/upload")
                .query(&[("prefix", prefix.as_str())])
                .send()
                .await?;

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(());
            }
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let body: DeleteResourcesResponse = response
                .json()
                .await
                .map_err(|e| AssetHostError::Parse(e.to_string()))?;
            if !body.partial {
                return Ok(());
            }
        }

        Err(AssetHostError::Api {
            status: StatusCode::OK.as_u16(),
            message: format!("{folder} still has images after {MAX_PREFIX_DELETE_ROUNDS} rounds"),
        })
    }
}

#[async_trait]
impl AssetHost for CloudinaryClient {
    async fn list_folders(&self, namespace: &str) -> Result<Vec<FolderName>, AssetHostError> {
        let path = format!("folders/{}", encode_path(namespace.trim_matches('/')));
        let mut folders = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self.get(&path).query(&[("max_results", FOLDER_PAGE_SIZE)]);
            if let Some(next) = cursor.as_deref() {
                request = request.query(&[("next_cursor", next)]);
            }

            let response = request.send().await?;
            // No namespace folder yet means no project uploads yet
            if response.status() == StatusCode::NOT_FOUND && cursor.is_none() {
                return Ok(Vec::new());
            }
            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let page: FolderListResponse = response
                .json()
                .await
                .map_err(|e| AssetHostError::Parse(e.to_string()))?;

            for entry in page.folders {
                let folder = FolderName::parse(&entry.path).map_err(|e| {
                    AssetHostError::Parse(format!("folder {:?}: {e}", entry.name))
                })?;
                folders.push(folder);
            }

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(folders)
    }

    async fn oldest_asset_created_at(
        &self,
        folder: &FolderName,
    ) -> Result<Option<DateTime<Utc>>, AssetHostError> {
        let body = serde_json::json!({
            "expression": format!("folder=\"{}\"", folder.as_str()),
            "sort_by": [{ "created_at": "asc" }],
            "max_results": 1,
        });

        let response = self.post("resources/search").json(&body).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| AssetHostError::Parse(e.to_string()))?;

        Ok(search.resources.into_iter().next().map(|r| r.created_at))
    }

    async fn delete_folder(&self, folder: &FolderName) -> Result<(), AssetHostError> {
        self.delete_resources_by_prefix(folder).await?;

        let response = self
            .delete(&format!("folders/{}", encode_path(folder.as_str())))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(folder = %folder, "Folder already gone");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn delete_asset(&self, asset_id: &AssetId) -> Result<(), AssetHostError> {
        let response = self
            .delete("resources/image/upload")
            .query(&[("public_ids[]", asset_id.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: DeleteResourcesResponse = response
            .json()
            .await
            .map_err(|e| AssetHostError::Parse(e.to_string()))?;

        match body.deleted.get(asset_id.as_str()).map(String::as_str) {
            Some("deleted") => Ok(()),
            Some("not_found") | None => Err(AssetHostError::NotFound(asset_id.to_string())),
            Some(other) => Err(AssetHostError::Api {
                status: StatusCode::OK.as_u16(),
                message: format!("unexpected delete result {other:?}"),
            }),
        }
    }
}

/// Percent-encode each segment of a folder path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Turn a non-2xx response into an `Api` error, preferring Cloudinary's own
/// message.
async fn api_error(response: reqwest::Response) -> AssetHostError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text);
    AssetHostError::Api { status, message }
}
