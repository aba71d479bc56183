//! One-shot orphaned folder cleanup.
//!
//! Same reconciler as `GET /cleanup`, for running from cron without an admin
//! session.
//!
//! # Usage
//!
//! ```bash
//! # Delete unreferenced project folders older than the configured age
//! ws-cli cleanup
//!
//! # Show what would be deleted
//! ws-cli cleanup --dry-run --max-age-secs 86400
//! ```

use std::time::Duration;

use mockable::DefaultClock;
use thiserror::Error;
use woodshop_web::config::{CleanupConfig, ConfigError};
use woodshop_web::db::{ProjectRepository, create_pool};
use woodshop_web::services::CloudinaryClient;
use woodshop_web::services::reconciler::{OrphanReconciler, ReconcileError, known_folders};

/// Errors that can occur during cleanup.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Run the reconciler once.
///
/// # Errors
///
/// Returns `CleanupError` if configuration is incomplete, the project query
/// fails, or the Cloudinary folder listing fails.
pub async fn run(max_age_secs: Option<u64>, dry_run: bool) -> Result<(), CleanupError> {
    let config = CleanupConfig::from_env()?;
    let max_age = max_age_secs.map_or(config.orphaned_folder_max_age, Duration::from_secs);
    let namespace = config.cloudinary.project_folder.as_str();

    let pool = create_pool(&config.database_url).await?;
    let projects = ProjectRepository::new(pool);
    let host = CloudinaryClient::new(&config.cloudinary);
    let clock = DefaultClock;

    let known = known_folders(&projects, namespace).await?;
    tracing::info!(
        "{} folder(s) referenced by projects; threshold {}s",
        known.len(),
        max_age.as_secs()
    );

    let reconciler = OrphanReconciler::new(&host, &clock, namespace);

    if dry_run {
        let candidates = reconciler.candidates(&known, max_age).await?;
        if candidates.is_empty() {
            tracing::info!("No orphaned folders to delete.");
        }
        for candidate in candidates {
            tracing::info!(
                "Would delete {} (oldest image {}, {}h old)",
                candidate.folder,
                candidate.oldest_asset_at.format("%Y-%m-%d %H:%M UTC"),
                candidate.age.num_hours()
            );
        }
        return Ok(());
    }

    let deleted = reconciler.reconcile(&known, max_age).await?;
    if deleted.is_empty() {
        tracing::info!("No orphaned folders to delete.");
    } else {
        tracing::info!("Deleted {} orphaned folder(s).", deleted.len());
    }
    Ok(())
}
