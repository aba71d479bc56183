//! Cloudinary asset handlers: orphan cleanup, single-asset deletion and
//! upload signing. All admin-only.

use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use woodshop_core::{AssetId, FolderName};

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::services::cloudinary::UploadSignature;
use crate::services::reconciler::{OrphanReconciler, known_folders};
use crate::state::AppState;

/// Response for `GET /cleanup`.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub ok: bool,
    pub deleted: Vec<FolderName>,
    pub message: String,
}

/// Response for a successful `POST /delete-asset`.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Optional body for `POST /upload-signature`.
#[derive(Debug, Default, Deserialize)]
pub struct UploadSignatureRequest {
    #[serde(default)]
    pub folder: Option<String>,
}

/// Delete project folders nothing references any more.
///
/// # Errors
///
/// Returns 401/403 from the admin guard and 500 if the project query or the
/// folder listing fails.
#[instrument(skip_all)]
pub async fn cleanup(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<CleanupResponse>, AppError> {
    let namespace = state.config().cloudinary.project_folder.as_str();
    let known = known_folders(state.projects(), namespace).await?;

    let deleted = OrphanReconciler::new(state.assets(), state.clock(), namespace)
        .reconcile(&known, state.config().orphaned_folder_max_age)
        .await?;

    tracing::info!(admin = %admin.email, deleted = deleted.len(), "Orphaned folder cleanup finished");

    Ok(Json(CleanupResponse {
        ok: true,
        message: cleanup_message(deleted.len()),
        deleted,
    }))
}

fn cleanup_message(count: usize) -> String {
    if count == 0 {
        "No orphaned folders to delete.".to_string()
    } else {
        format!("Deleted {count} orphaned folder(s).")
    }
}

/// Delete one uploaded image, typically an abandoned upload.
///
/// Accepts `{ "assetId": "..." }`, or `publicId` as sent by the upload widget.
///
/// # Errors
///
/// Returns 400 for a malformed body or identifier and 500 if Cloudinary
/// reports any failure, including an unknown asset.
#[instrument(skip_all)]
pub async fn delete_asset(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, AppError> {
    let value: Value = serde_json::from_slice(&body)
        .map_err(|_| AppError::Validation("Invalid JSON body".to_string()))?;

    let asset_id = parse_asset_id(&value)
        .ok_or_else(|| AppError::Validation("Missing or invalid assetId".to_string()))?;

    state.assets().delete_asset(&asset_id).await?;
    tracing::info!(admin = %admin.email, asset_id = %asset_id, "Deleted asset");

    Ok(Json(OkResponse { ok: true }))
}

fn parse_asset_id(body: &Value) -> Option<AssetId> {
    let raw = body
        .get("assetId")
        .or_else(|| body.get("publicId"))?
        .as_str()?;
    AssetId::parse(raw).ok()
}

/// Sign a direct browser upload to Cloudinary.
///
/// A requested folder is placed under the project namespace so the reconciler
/// can find it later. An empty body signs an upload without a folder.
///
/// # Errors
///
/// Returns 400 if the body is not valid JSON or the folder is unusable.
#[instrument(skip_all)]
pub async fn upload_signature(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UploadSignature>, AppError> {
    let request: UploadSignatureRequest = if body.is_empty() {
        UploadSignatureRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| AppError::Validation("Invalid JSON body".to_string()))?
    };

    let folder = request
        .folder
        .filter(|f| !f.trim().is_empty())
        .map(|f| FolderName::qualified(&state.config().cloudinary.project_folder, &f))
        .transpose()
        .map_err(|e| AppError::Validation(format!("Invalid folder: {e}")))?;

    let timestamp = state.clock().utc().timestamp();
    Ok(Json(state.cloudinary().sign_upload(folder, timestamp)))
}
