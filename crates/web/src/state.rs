//! Application state shared across handlers.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::content::SettingsStore;
use crate::db::{ProjectRepository, SettingsRepository, UserRepository};
use crate::services::auth::UserDirectory;
use crate::services::cloudinary::{AssetHost, CloudinaryClient};
use crate::services::projects::ProjectCatalog;
use crate::services::reconciler::ProjectFolderSource;
use crate::services::{GoogleOAuthClient, Web3FormsClient};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Storage and the asset host sit behind trait
/// objects so handlers can be exercised without a database or network.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    users: Arc<dyn UserDirectory>,
    settings: Arc<dyn SettingsStore>,
    catalog: Arc<dyn ProjectCatalog>,
    projects: Arc<dyn ProjectFolderSource>,
    assets: Arc<dyn AssetHost>,
    cloudinary: CloudinaryClient,
    google: GoogleOAuthClient,
    web3forms: Option<Web3FormsClient>,
    clock: Arc<dyn Clock>,
}

/// Collaborators for [`AppState::from_parts`].
pub struct StateParts {
    pub config: SiteConfig,
    pub pool: PgPool,
    pub users: Arc<dyn UserDirectory>,
    pub settings: Arc<dyn SettingsStore>,
    pub catalog: Arc<dyn ProjectCatalog>,
    pub projects: Arc<dyn ProjectFolderSource>,
    pub assets: Arc<dyn AssetHost>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create the production state: Postgres repositories, Cloudinary, and
    /// the system clock.
    #[must_use]
    pub fn new(config: SiteConfig, pool: PgPool) -> Self {
        let cloudinary = CloudinaryClient::new(&config.cloudinary);
        let projects = ProjectRepository::new(pool.clone());
        Self::from_parts(StateParts {
            users: Arc::new(UserRepository::new(pool.clone())),
            settings: Arc::new(SettingsRepository::new(pool.clone())),
            catalog: Arc::new(projects.clone()),
            projects: Arc::new(projects),
            assets: Arc::new(cloudinary),
            clock: Arc::new(DefaultClock),
            config,
            pool,
        })
    }

    /// Create state from explicit collaborators.
    #[must_use]
    pub fn from_parts(parts: StateParts) -> Self {
        let cloudinary = CloudinaryClient::new(&parts.config.cloudinary);
        let google = GoogleOAuthClient::new(&parts.config.google);
        let web3forms = parts.config.web3forms.as_ref().map(Web3FormsClient::new);

        Self {
            inner: Arc::new(AppStateInner {
                config: parts.config,
                pool: parts.pool,
                users: parts.users,
                settings: parts.settings,
                catalog: parts.catalog,
                projects: parts.projects,
                assets: parts.assets,
                cloudinary,
                google,
                web3forms,
                clock: parts.clock,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// User lookups for the admin guard and sign-in.
    #[must_use]
    pub fn users(&self) -> &dyn UserDirectory {
        self.inner.users.as_ref()
    }

    /// Site settings storage.
    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.inner.settings.as_ref()
    }

    /// Gallery project storage.
    #[must_use]
    pub fn catalog(&self) -> &dyn ProjectCatalog {
        self.inner.catalog.as_ref()
    }

    /// Folder references of saved projects.
    #[must_use]
    pub fn projects(&self) -> &dyn ProjectFolderSource {
        self.inner.projects.as_ref()
    }

    /// Remote image host.
    #[must_use]
    pub fn assets(&self) -> &dyn AssetHost {
        self.inner.assets.as_ref()
    }

    /// Cloudinary client used for upload signing.
    #[must_use]
    pub fn cloudinary(&self) -> &CloudinaryClient {
        &self.inner.cloudinary
    }

    /// Google OAuth client.
    #[must_use]
    pub fn google(&self) -> &GoogleOAuthClient {
        &self.inner.google
    }

    /// Web3Forms client, `None` when the contact form is disabled.
    #[must_use]
    pub fn web3forms(&self) -> Option<&Web3FormsClient> {
        self.inner.web3forms.as_ref()
    }

    /// Clock for age comparisons and signature timestamps.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }
}
