//! Shared fixtures for handler and service tests.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use woodshop_core::{Email, SettingKey, UserId};

use crate::config::tests::test_config;
use crate::content::SettingsStore;
use crate::db::RepositoryError;
use crate::middleware::session_layer;
use crate::models::{AdminFlag, SessionIdentity, SiteSetting, session_keys};
use crate::services::auth::MockUserDirectory;
use crate::services::cloudinary::MockAssetHost;
use crate::services::projects::MockProjectCatalog;
use crate::services::reconciler::MockProjectFolderSource;
use crate::state::{AppState, StateParts};

/// Clock pinned to one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The instant every test clock is pinned to.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// Session identity for a signed-in user.
pub fn identity(user_id: UserId, email: &str) -> SessionIdentity {
    SessionIdentity {
        user_id: Some(user_id),
        email: Some(Email::parse(email).unwrap()),
        name: None,
    }
}

/// A directory that knows exactly one user.
pub fn directory_with(user_id: UserId, email: &str, is_admin: bool) -> MockUserDirectory {
    let email = Email::parse(email).unwrap();
    let mut users = MockUserDirectory::new();
    users
        .expect_find_admin_flag_by_id()
        .returning(move |id| {
            Ok((id == user_id).then(|| AdminFlag {
                user_id,
                email: email.clone(),
                is_admin,
            }))
        });
    users
}

/// Settings kept in a map; clones share the same map.
#[derive(Clone, Default)]
pub struct InMemorySettings(Arc<Mutex<BTreeMap<SettingKey, Option<String>>>>);

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn get_many(&self, keys: &[SettingKey]) -> Result<Vec<SiteSetting>, RepositoryError> {
        let map = self.0.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|key| {
                map.get(key).map(|value| SiteSetting {
                    key: key.clone(),
                    value: value.clone(),
                    updated_at: now(),
                })
            })
            .collect())
    }

    async fn upsert(
        &self,
        key: &SettingKey,
        value: Option<&str>,
    ) -> Result<SiteSetting, RepositoryError> {
        let value = value.map(str::to_owned);
        self.0.lock().unwrap().insert(key.clone(), value.clone());
        Ok(SiteSetting {
            key: key.clone(),
            value,
            updated_at: now(),
        })
    }
}

/// Test doubles behind [`AppState`]. Mocks without expectations panic when
/// called.
#[derive(Default)]
pub struct Doubles {
    pub users: MockUserDirectory,
    pub settings: InMemorySettings,
    pub catalog: MockProjectCatalog,
    pub projects: MockProjectFolderSource,
    pub assets: MockAssetHost,
}

/// State over test doubles and a pool that never connects unless a handler
/// actually queries it.
pub fn state_from(doubles: Doubles) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/woodshop_test")
        .unwrap();

    AppState::from_parts(StateParts {
        config: test_config(),
        pool,
        users: Arc::new(doubles.users),
        settings: Arc::new(doubles.settings),
        catalog: Arc::new(doubles.catalog),
        projects: Arc::new(doubles.projects),
        assets: Arc::new(doubles.assets),
        clock: Arc::new(FixedClock(now())),
    })
}

/// [`state_from`] with an empty settings store and no catalog calls.
pub fn state_with(
    users: MockUserDirectory,
    projects: MockProjectFolderSource,
    assets: MockAssetHost,
) -> AppState {
    state_from(Doubles {
        users,
        projects,
        assets,
        ..Doubles::default()
    })
}

/// Router signed in as an admin. `doubles.users` is replaced with a
/// directory that knows that admin.
pub fn admin_app(doubles: Doubles) -> Router {
    let id = UserId::random();
    let state = state_from(Doubles {
        users: directory_with(id, "owner@woodshop.com", true),
        ..doubles
    });
    app(state, Some(identity(id, "owner@woodshop.com")))
}

/// Full router with an in-memory session store. When `signed_in` is set the
/// identity is written into the session before the handler runs.
pub fn app(state: AppState, signed_in: Option<SessionIdentity>) -> Router {
    let sign_in = middleware::from_fn(move |session: Session, request: Request, next: Next| {
        let signed_in = signed_in.clone();
        async move {
            if let Some(identity) = signed_in {
                session
                    .insert(session_keys::CURRENT_USER, identity)
                    .await
                    .unwrap();
            }
            next.run(request).await
        }
    });

    crate::routes::routes()
        .layer(sign_in)
        .layer(session_layer(MemoryStore::default(), false))
        .with_state(state)
}

/// Send a request and decode the JSON body (`Null` when empty or not JSON).
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// JSON request helper.
pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

/// Body-less request helper.
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
