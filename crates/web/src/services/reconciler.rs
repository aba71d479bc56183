//! Orphaned project folder cleanup.
//!
//! Images for a new project are uploaded before the project is saved. If the
//! editor is abandoned, the folder stays on Cloudinary with nothing pointing
//! at it. The reconciler compares the host's project folders against the
//! folders referenced by saved projects and deletes the unreferenced ones
//! whose oldest image is older than a threshold.
//!
//! Failure handling is uneven: if the folder listing fails the
//! whole run fails, while a failure on one folder only skips that folder.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use thiserror::Error;

use woodshop_core::FolderName;

use crate::db::RepositoryError;
use crate::services::cloudinary::{AssetHost, AssetHostError};

/// Source of the folders saved projects point at.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectFolderSource: Send + Sync {
    /// Non-empty, trimmed `cloudinary_folder` values of every project.
    async fn list_folder_references(&self) -> Result<Vec<String>, RepositoryError>;
}

/// Errors that abort a reconcile run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Known folder references could not be read.
    #[error("failed to load project folders: {0}")]
    Storage(#[from] RepositoryError),

    /// The host's folder listing failed.
    #[error("failed to list remote folders: {0}")]
    Listing(#[source] AssetHostError),
}

/// A folder that would be deleted, with the age of its oldest image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanCandidate {
    pub folder: FolderName,
    pub oldest_asset_at: DateTime<Utc>,
    pub age: TimeDelta,
}

/// Load the folders referenced by saved projects, qualified under `namespace`
/// so they compare equal to the host's folder paths.
///
/// # Errors
///
/// Returns `ReconcileError::Storage` if the query fails.
pub async fn known_folders(
    source: &dyn ProjectFolderSource,
    namespace: &str,
) -> Result<HashSet<FolderName>, ReconcileError> {
    let references = source.list_folder_references().await?;

    Ok(references
        .iter()
        .filter_map(|raw| match FolderName::qualified(namespace, raw) {
            Ok(folder) => Some(folder),
            Err(e) => {
                tracing::warn!(reference = %raw, error = %e, "Ignoring unusable folder reference");
                None
            }
        })
        .collect())
}

/// Deletes unreferenced, aged project folders.
pub struct OrphanReconciler<'a> {
    host: &'a dyn AssetHost,
    clock: &'a dyn Clock,
    namespace: &'a str,
}

impl<'a> OrphanReconciler<'a> {
    /// Create a reconciler over the folders under `namespace`.
    #[must_use]
    pub const fn new(host: &'a dyn AssetHost, clock: &'a dyn Clock, namespace: &'a str) -> Self {
        Self {
            host,
            clock,
            namespace,
        }
    }

    /// Find folders eligible for deletion without deleting anything.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Listing` if the folder listing fails.
    pub async fn candidates(
        &self,
        known_folders: &HashSet<FolderName>,
        age_threshold: Duration,
    ) -> Result<Vec<OrphanCandidate>, ReconcileError> {
        let folders = self
            .host
            .list_folders(self.namespace)
            .await
            .map_err(ReconcileError::Listing)?;

        let threshold = TimeDelta::from_std(age_threshold).unwrap_or(TimeDelta::MAX);
        let now = self.clock.utc();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for folder in folders {
            if !seen.insert(folder.clone()) {
                continue;
            }
            if known_folders.contains(&folder) {
                tracing::debug!(folder = %folder, "Skipping referenced folder");
                continue;
            }

            let oldest_asset_at = match self.host.oldest_asset_created_at(&folder).await {
                Ok(Some(at)) => at,
                Ok(None) => {
                    tracing::debug!(folder = %folder, "Skipping empty folder");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(folder = %folder, error = %e, "Skipping folder with unknown age");
                    continue;
                }
            };

            let age = now.signed_duration_since(oldest_asset_at);
            if age <= threshold {
                tracing::debug!(
                    folder = %folder,
                    age_secs = age.num_seconds(),
                    "Skipping folder that may still be in use"
                );
                continue;
            }

            candidates.push(OrphanCandidate {
                folder,
                oldest_asset_at,
                age,
            });
        }

        Ok(candidates)
    }

    /// Delete every eligible folder and return the ones actually deleted, in
    /// listing order.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::Listing` if the folder listing fails. Errors
    /// on individual folders are logged and leave the folder out of the result.
    pub async fn reconcile(
        &self,
        known_folders: &HashSet<FolderName>,
        age_threshold: Duration,
    ) -> Result<Vec<FolderName>, ReconcileError> {
        let candidates = self.candidates(known_folders, age_threshold).await?;
        let mut deleted = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match self.host.delete_folder(&candidate.folder).await {
                Ok(()) => {
                    tracing::info!(
                        folder = %candidate.folder,
                        age_secs = candidate.age.num_seconds(),
                        "Deleted orphaned folder"
                    );
                    deleted.push(candidate.folder);
                }
                Err(e) => {
                    tracing::warn!(folder = %candidate.folder, error = %e, "Failed to delete orphaned folder");
                }
            }
        }

        Ok(deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::services::cloudinary::MockAssetHost;
    use crate::test_support::{FixedClock, now};
    use woodshop_core::AssetId;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn folder(name: &str) -> FolderName {
        FolderName::qualified("projects", name).unwrap()
    }

    /// In-memory host whose folders disappear once deleted.
    struct FakeHost {
        folders: Mutex<Vec<(FolderName, Option<DateTime<Utc>>)>>,
    }

    impl FakeHost {
        fn new(folders: &[(&str, Option<TimeDelta>)]) -> Self {
            Self {
                folders: Mutex::new(
                    folders
                        .iter()
                        .map(|(name, age)| (folder(name), age.map(|a| now() - a)))
                        .collect(),
                ),
            }
        }

        fn remaining(&self) -> Vec<FolderName> {
            self.folders
                .lock()
                .unwrap()
                .iter()
                .map(|(f, _)| f.clone())
                .collect()
        }
    }

    #[async_trait]
    impl AssetHost for FakeHost {
        async fn list_folders(&self, _namespace: &str) -> Result<Vec<FolderName>, AssetHostError> {
            Ok(self.remaining())
        }

        async fn oldest_asset_created_at(
            &self,
            folder: &FolderName,
        ) -> Result<Option<DateTime<Utc>>, AssetHostError> {
            Ok(self
                .folders
                .lock()
                .unwrap()
                .iter()
                .find(|(f, _)| f == folder)
                .and_then(|(_, at)| *at))
        }

        async fn delete_folder(&self, folder: &FolderName) -> Result<(), AssetHostError> {
            self.folders.lock().unwrap().retain(|(f, _)| f != folder);
            Ok(())
        }

        async fn delete_asset(&self, asset_id: &AssetId) -> Result<(), AssetHostError> {
            Err(AssetHostError::NotFound(asset_id.to_string()))
        }
    }

    fn known(names: &[&str]) -> HashSet<FolderName> {
        names.iter().map(|n| folder(n)).collect()
    }

    #[tokio::test]
    async fn test_only_unreferenced_aged_folder_is_deleted() {
        let host = FakeHost::new(&[
            ("proj-A", Some(TimeDelta::hours(2))),
            ("proj-B", Some(TimeDelta::hours(2))),
            ("proj-C", Some(TimeDelta::minutes(30))),
        ]);
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let deleted = reconciler
            .reconcile(&known(&["proj-A"]), HOUR)
            .await
            .unwrap();

        assert_eq!(deleted, vec![folder("proj-B")]);
        assert_eq!(host.remaining(), vec![folder("proj-A"), folder("proj-C")]);
    }

    #[tokio::test]
    async fn test_second_run_deletes_nothing() {
        let host = FakeHost::new(&[
            ("proj-B", Some(TimeDelta::hours(5))),
            ("proj-D", Some(TimeDelta::days(3))),
        ]);
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let first = reconciler.reconcile(&HashSet::new(), HOUR).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = reconciler.reconcile(&HashSet::new(), HOUR).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_referenced_folders_survive_any_age() {
        let host = FakeHost::new(&[
            ("proj-A", Some(TimeDelta::days(365))),
            ("proj-E", Some(TimeDelta::days(30))),
        ]);
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let deleted = reconciler
            .reconcile(&known(&["proj-A", "proj-E"]), Duration::ZERO)
            .await
            .unwrap();

        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn test_age_equal_to_threshold_is_kept() {
        let host = FakeHost::new(&[
            ("exactly-an-hour", Some(TimeDelta::hours(1))),
            ("just-over", Some(TimeDelta::hours(1) + TimeDelta::seconds(1))),
        ]);
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let deleted = reconciler.reconcile(&HashSet::new(), HOUR).await.unwrap();

        assert_eq!(deleted, vec![folder("just-over")]);
    }

    #[tokio::test]
    async fn test_empty_folder_is_skipped() {
        let host = FakeHost::new(&[("empty", None)]);
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let deleted = reconciler.reconcile(&HashSet::new(), HOUR).await.unwrap();

        assert!(deleted.is_empty());
        assert_eq!(host.remaining(), vec![folder("empty")]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let mut host = MockAssetHost::new();
        host.expect_list_folders().returning(|_| {
            Err(AssetHostError::Api {
                status: 500,
                message: "General error".to_string(),
            })
        });
        host.expect_delete_folder().never();
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let result = reconciler.reconcile(&HashSet::new(), HOUR).await;
        assert!(matches!(result, Err(ReconcileError::Listing(_))));
    }

    #[tokio::test]
    async fn test_per_folder_failures_are_skipped() {
        let mut host = MockAssetHost::new();
        host.expect_list_folders().returning(|_| {
            Ok(vec![
                folder("age-lookup-fails"),
                folder("delete-fails"),
                folder("deletes-fine"),
            ])
        });
        host.expect_oldest_asset_created_at().returning(|f| {
            if f.as_str().ends_with("age-lookup-fails") {
                Err(AssetHostError::Parse("bad json".to_string()))
            } else {
                Ok(Some(now() - TimeDelta::hours(3)))
            }
        });
        host.expect_delete_folder()
            .withf(|f| f.as_str().ends_with("age-lookup-fails"))
            .never();
        host.expect_delete_folder()
            .withf(|f| f.as_str().ends_with("delete-fails"))
            .times(1)
            .returning(|_| {
                Err(AssetHostError::Api {
                    status: 420,
                    message: "Rate limit exceeded".to_string(),
                })
            });
        host.expect_delete_folder()
            .withf(|f| f.as_str().ends_with("deletes-fine"))
            .times(1)
            .returning(|_| Ok(()));
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let deleted = reconciler.reconcile(&HashSet::new(), HOUR).await.unwrap();

        assert_eq!(deleted, vec![folder("deletes-fine")]);
    }

    #[tokio::test]
    async fn test_duplicate_listing_entries_processed_once() {
        let mut host = MockAssetHost::new();
        host.expect_list_folders()
            .returning(|_| Ok(vec![folder("proj-B"), folder("proj-B")]));
        host.expect_oldest_asset_created_at()
            .times(1)
            .returning(|_| Ok(Some(now() - TimeDelta::hours(2))));
        host.expect_delete_folder().times(1).returning(|_| Ok(()));
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let deleted = reconciler.reconcile(&HashSet::new(), HOUR).await.unwrap();

        assert_eq!(deleted, vec![folder("proj-B")]);
    }

    #[tokio::test]
    async fn test_candidates_does_not_delete() {
        let host = FakeHost::new(&[("proj-B", Some(TimeDelta::hours(2)))]);
        let clock = FixedClock(now());
        let reconciler = OrphanReconciler::new(&host, &clock, "projects");

        let candidates = reconciler.candidates(&HashSet::new(), HOUR).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].age, TimeDelta::hours(2));
        assert_eq!(host.remaining(), vec![folder("proj-B")]);
    }

    #[tokio::test]
    async fn test_known_folders_are_qualified() {
        let mut source = MockProjectFolderSource::new();
        source.expect_list_folder_references().returning(|| {
            Ok(vec![
                "oak-bench".to_string(),
                "projects/walnut-table".to_string(),
                "/".to_string(),
            ])
        });

        let known = known_folders(&source, "projects").await.unwrap();

        assert_eq!(known.len(), 2);
        assert!(known.contains(&folder("oak-bench")));
        assert!(known.contains(&folder("walnut-table")));
    }

    #[tokio::test]
    async fn test_known_folders_storage_failure() {
        let mut source = MockProjectFolderSource::new();
        source
            .expect_list_folder_references()
            .returning(|| Err(RepositoryError::NotFound));

        let result = known_folders(&source, "projects").await;
        assert!(matches!(result, Err(ReconcileError::Storage(_))));
    }
}
