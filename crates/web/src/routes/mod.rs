//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! GET   /auth/google/login     - Redirect to Google consent screen
//! GET   /auth/google/callback  - Handle OAuth callback, admit allow-listed admins
//! POST  /auth/logout           - Flush the session
//! GET   /auth/session          - Current user and admin flag (null when signed out)
//!
//! # Content
//! GET   /site-settings?keys=   - Read settings (public)
//! PATCH /site-settings         - Write one setting (admin)
//! GET   /content/about         - About page sections
//! GET   /content/home          - Home page hero
//!
//! # Projects
//! GET    /projects?page&tag&year - One gallery page (public)
//! GET    /projects/filters       - Tags and years in use (public)
//! GET    /projects/{id}          - One project (public)
//! POST   /projects               - Create a project (admin)
//! PATCH  /projects/{id}          - Edit a project (admin)
//! DELETE /projects/{id}          - Delete a project (admin)
//! GET    /projects/order?year=   - Projects in gallery order (admin)
//! PUT    /projects/order         - Save a new order (admin)
//!
//! # Assets (admin)
//! GET   /cleanup               - Delete orphaned project folders
//! POST  /delete-asset          - Delete one uploaded image
//! POST  /upload-signature      - Sign a direct browser upload
//!
//! # Contact
//! POST  /contact               - Forward a message through Web3Forms
//! ```
//!
//! `/health` and `/health/ready` are mounted by the binary.

pub mod assets;
pub mod auth;
pub mod contact;
pub mod content;
pub mod projects;
pub mod settings;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router (mounted under `/auth`).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/google/login", get(auth::login))
        .route("/google/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

/// Create the application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route(
            "/site-settings",
            get(settings::get_settings).patch(settings::update_setting),
        )
        .route("/content/about", get(content::about))
        .route("/content/home", get(content::home))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/projects/filters", get(projects::project_filters))
        .route(
            "/projects/order",
            get(projects::project_order).put(projects::reorder_projects),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/cleanup", get(assets::cleanup))
        .route("/delete-asset", post(assets::delete_asset))
        .route("/upload-signature", post(assets::upload_signature))
        .route("/contact", post(contact::submit))
}
