//! Unified error handling for the JSON API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::GuardError;
use crate::services::cloudinary::AssetHostError;
use crate::services::reconciler::ReconcileError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// No signed-in identity.
    #[error("Unauthorized")]
    Unauthenticated,

    /// Signed in, but not an admin.
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing request input.
    #[error("{0}")]
    Validation(String),

    /// A third-party service call failed.
    #[error("{0}")]
    External(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::External(_) | Self::Internal(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        }

        // Database details stay in the logs
        let error = match &self {
            Self::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Storage(e) => Self::Database(e),
            GuardError::Session(e) => Self::Internal(format!("session store: {e}")),
        }
    }
}

impl From<AssetHostError> for AppError {
    fn from(err: AssetHostError) -> Self {
        Self::External(err.to_string())
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Storage(e) => Self::Database(e),
            ReconcileError::Listing(e) => Self::External(e.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::Unauthenticated.to_string(), "Unauthorized");
        assert_eq!(AppError::Forbidden.to_string(), "Forbidden");
        let err = AppError::Validation("Missing or invalid assetId".to_string());
        assert_eq!(err.to_string(), "Missing or invalid assetId");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::External("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_guard_rejections_have_fixed_bodies() {
        let (status, body) = body_json(AppError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({ "error": "Unauthorized" }));

        let (status, body) = body_json(AppError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, serde_json::json!({ "error": "Forbidden" }));
    }

    #[tokio::test]
    async fn test_database_error_is_not_leaked() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "bad email in users row".to_string(),
        ));
        let (_, body) = body_json(err).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_listing_failure_maps_to_external() {
        let err: AppError = ReconcileError::Listing(AssetHostError::Api {
            status: 420,
            message: "rate limited".to_string(),
        })
        .into();
        assert!(matches!(err, AppError::External(_)));
    }
}
