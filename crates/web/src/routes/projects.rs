//! Gallery project handlers.
//!
//! Reads are public; creating, editing, deleting and reordering need an
//! admin. Deleting a project leaves its image folder in place for the orphan
//! cleanup to collect.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use mockable::Clock;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use woodshop_core::ProjectId;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::ProjectView;
use crate::routes::assets::OkResponse;
use crate::services::projects::{
    CreateProjectRequest, PAGE_SIZE, ProjectFacets, ProjectFilter, ProjectPage, TagFilter,
    UpdateProjectRequest, page_offset, validate_order,
};
use crate::state::AppState;

/// Query for `GET /projects`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// A tag, or `__none__` for untagged projects.
    pub tag: Option<String>,
    pub year: Option<i32>,
}

/// Query for `GET /projects/order`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub year: Option<i32>,
}

/// Body of `PUT /projects/order`.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<ProjectId>,
}

/// Response for `GET /projects/order`.
#[derive(Debug, Serialize)]
pub struct OrderedProjects {
    pub projects: Vec<ProjectView>,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {e}")))
}

fn not_found(id: ProjectId) -> AppError {
    AppError::NotFound(format!("project {id}"))
}

/// One page of the gallery.
///
/// # Errors
///
/// Returns 400 for page 0 and 500 if the query fails.
#[instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProjectPage>, AppError> {
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(AppError::Validation("Page must be at least 1".to_string()));
    }
    let filter = ProjectFilter {
        tag: TagFilter::parse(query.tag.as_deref()),
        year: query.year,
    };

    let (projects, total) = state
        .catalog()
        .list(&filter, i64::from(PAGE_SIZE), page_offset(page))
        .await?;

    Ok(Json(ProjectPage::new(projects, page, total)))
}

/// Tags and years for the gallery filter controls.
///
/// # Errors
///
/// Returns 500 if the query fails.
pub async fn project_filters(
    State(state): State<AppState>,
) -> Result<Json<ProjectFacets>, AppError> {
    Ok(Json(state.catalog().facets().await?))
}

/// One project.
///
/// # Errors
///
/// Returns 404 for an unknown id and 500 if the query fails.
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectView>, AppError> {
    let project = state.catalog().get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(project.into()))
}

/// Create a project at the front of the gallery.
///
/// # Errors
///
/// Returns 401/403 from the admin guard, 400 for an invalid body and 500 if
/// the insert fails.
#[instrument(skip_all)]
pub async fn create_project(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ProjectView>), AppError> {
    let today = state.clock().utc().date_naive();
    let draft = parse_body::<CreateProjectRequest>(&body)?
        .into_draft(&state.config().cloudinary.project_folder, today)
        .map_err(AppError::Validation)?;

    let project = state.catalog().create(&draft).await?;

    tracing::info!(admin = %admin.email, project_id = %project.id, "Created project");

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// Edit a project. Absent fields are left alone; `null` clears optional ones.
///
/// # Errors
///
/// Returns 401/403 from the admin guard, 400 for an invalid body, 404 for an
/// unknown id and 500 if the update fails.
#[instrument(skip_all, fields(project_id = %id))]
pub async fn update_project(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    body: Bytes,
) -> Result<Json<ProjectView>, AppError> {
    let changes = parse_body::<UpdateProjectRequest>(&body)?
        .into_changes(&state.config().cloudinary.project_folder)
        .map_err(AppError::Validation)?;

    let project = state
        .catalog()
        .update(id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(admin = %admin.email, "Updated project");

    Ok(Json(project.into()))
}

/// Delete a project.
///
/// # Errors
///
/// Returns 401/403 from the admin guard, 404 for an unknown id and 500 if the
/// delete fails.
#[instrument(skip_all, fields(project_id = %id))]
pub async fn delete_project(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> Result<Json<OkResponse>, AppError> {
    if !state.catalog().delete(id).await? {
        return Err(not_found(id));
    }

    tracing::info!(admin = %admin.email, "Deleted project");

    Ok(Json(OkResponse { ok: true }))
}

/// Every project in gallery order, for the reorder view.
///
/// # Errors
///
/// Returns 401/403 from the admin guard and 500 if the query fails.
pub async fn project_order(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<OrderedProjects>, AppError> {
    let projects = state.catalog().list_in_order(query.year).await?;
    Ok(Json(OrderedProjects {
        projects: projects.into_iter().map(ProjectView::from).collect(),
    }))
}

/// Save a new order for some or all projects.
///
/// # Errors
///
/// Returns 401/403 from the admin guard, 400 for an empty or repeating id
/// list, 404 if an id is unknown and 500 if the update fails.
#[instrument(skip_all)]
pub async fn reorder_projects(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<OkResponse>, AppError> {
    let request: ReorderRequest = parse_body(&body)?;
    validate_order(&request.ids).map_err(|e| AppError::Validation(e.to_string()))?;

    match state.catalog().reorder(&request.ids).await {
        Ok(()) => {}
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound("one or more projects".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(admin = %admin.email, count = request.ids.len(), "Reordered projects");

    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::Project;
    use crate::services::projects::MockProjectCatalog;
    use crate::test_support::{
        Doubles, admin_app, app, empty_request, json_request, now, send, state_from,
    };

    fn project(id: ProjectId, title: &str) -> Project {
        Project {
            id,
            title: title.to_string(),
            description: None,
            cloudinary_folder: Some("projects/walnut-table".to_string()),
            cover_image: None,
            tags: vec!["Tables".to_string()],
            created_at: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            date_is_month_only: false,
            sort_order: 0,
            updated_at: now(),
        }
    }

    fn public_app(catalog: MockProjectCatalog) -> axum::Router {
        app(
            state_from(Doubles {
                catalog,
                ..Doubles::default()
            }),
            None,
        )
    }

    fn admin_with(catalog: MockProjectCatalog) -> axum::Router {
        admin_app(Doubles {
            catalog,
            ..Doubles::default()
        })
    }

    #[tokio::test]
    async fn test_list_applies_filter_and_page() {
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_list()
            .withf(|filter, limit, offset| {
                filter.tag == TagFilter::Tag("Tables".to_string())
                    && filter.year == Some(2025)
                    && *limit == 6
                    && *offset == 6
            })
            .returning(|_, _, _| Ok((vec![project(ProjectId::random(), "Walnut table")], 7)));

        let (status, body) = send(
            public_app(catalog),
            empty_request("GET", "/projects?page=2&tag=Tables&year=2025"),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["page"], 2);
        assert_eq!(body["pageSize"], 6);
        assert_eq!(body["total"], 7);
        assert_eq!(body["hasMore"], false);
        assert_eq!(body["projects"][0]["title"], "Walnut table");
        assert_eq!(body["projects"][0]["displayDate"], "March 14, 2025");
    }

    #[tokio::test]
    async fn test_list_untagged_filter() {
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_list()
            .withf(|filter, _, offset| filter.tag == TagFilter::Untagged && *offset == 0)
            .returning(|_, _, _| Ok((Vec::new(), 0)));

        let (status, body) = send(
            public_app(catalog),
            empty_request("GET", "/projects?tag=__none__"),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["projects"], serde_json::json!([]));
        assert_eq!(body["hasMore"], false);
    }

    #[tokio::test]
    async fn test_list_rejects_page_zero() {
        let (status, body) = send(
            public_app(MockProjectCatalog::new()),
            empty_request("GET", "/projects?page=0"),
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "Page must be at least 1");
    }

    #[tokio::test]
    async fn test_filters_lists_facets() {
        let mut catalog = MockProjectCatalog::new();
        catalog.expect_facets().returning(|| {
            Ok(ProjectFacets {
                tags: vec!["Chairs".to_string(), "Tables".to_string()],
                years: vec![2026, 2025],
            })
        });

        let (status, body) =
            send(public_app(catalog), empty_request("GET", "/projects/filters")).await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            serde_json::json!({ "tags": ["Chairs", "Tables"], "years": [2026, 2025] })
        );
    }

    #[tokio::test]
    async fn test_get_unknown_project_is_not_found() {
        let id = ProjectId::random();
        let mut catalog = MockProjectCatalog::new();
        catalog.expect_get().returning(|_| Ok(None));

        let (status, body) = send(
            public_app(catalog),
            empty_request("GET", &format!("/projects/{id}")),
        )
        .await;

        assert_eq!(status, 404);
        assert_eq!(body["error"], format!("Not found: project {id}"));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let (status, _) = send(
            public_app(MockProjectCatalog::new()),
            json_request("POST", "/projects", r#"{"title":"Oak bench"}"#),
        )
        .await;

        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn test_create_validates_and_inserts() {
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_create()
            .withf(|draft| {
                draft.title == "Oak bench"
                    && draft.cloudinary_folder.as_ref().map(|f| f.as_str())
                        == Some("projects/oak-bench")
                    && draft.created_at == now().date_naive()
            })
            .returning(|draft| {
                let mut created = project(ProjectId::random(), &draft.title);
                created.created_at = draft.created_at;
                Ok(created)
            });

        let (status, body) = send(
            admin_with(catalog),
            json_request(
                "POST",
                "/projects",
                r#"{"title":" Oak bench ","cloudinaryFolder":"oak-bench"}"#,
            ),
        )
        .await;

        assert_eq!(status, 201);
        assert_eq!(body["title"], "Oak bench");
        assert_eq!(body["displayDate"], "June 1, 2025");
    }

    #[tokio::test]
    async fn test_create_without_title_is_bad_request() {
        let (status, body) = send(
            admin_with(MockProjectCatalog::new()),
            json_request("POST", "/projects", r#"{"tags":["Tables"]}"#),
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "Title is required");
    }

    #[tokio::test]
    async fn test_update_clears_nullable_field() {
        let id = ProjectId::random();
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_update()
            .withf(move |got, changes| {
                *got == id && changes.cover_image == Some(None) && changes.title.is_none()
            })
            .returning(|id, _| Ok(Some(project(id, "Walnut table"))));

        let (status, body) = send(
            admin_with(catalog),
            json_request("PATCH", &format!("/projects/{id}"), r#"{"coverImage":null}"#),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["id"], id.to_string());
        assert_eq!(body["coverImage"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_update_unknown_project_is_not_found() {
        let mut catalog = MockProjectCatalog::new();
        catalog.expect_update().returning(|_, _| Ok(None));

        let (status, _) = send(
            admin_with(catalog),
            json_request(
                "PATCH",
                &format!("/projects/{}", ProjectId::random()),
                r#"{"title":"Renamed"}"#,
            ),
        )
        .await;

        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_delete_project() {
        let id = ProjectId::random();
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_delete()
            .withf(move |got| *got == id)
            .returning(|_| Ok(true));

        let (status, body) = send(
            admin_with(catalog),
            empty_request("DELETE", &format!("/projects/{id}")),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_delete_unknown_project_is_not_found() {
        let mut catalog = MockProjectCatalog::new();
        catalog.expect_delete().returning(|_| Ok(false));

        let (status, _) = send(
            admin_with(catalog),
            empty_request("DELETE", &format!("/projects/{}", ProjectId::random())),
        )
        .await;

        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_order_lists_year() {
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_list_in_order()
            .withf(|year| *year == Some(2025))
            .returning(|_| Ok(vec![project(ProjectId::random(), "Walnut table")]));

        let (status, body) = send(
            admin_with(catalog),
            empty_request("GET", "/projects/order?year=2025"),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body["projects"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reorder_saves_order() {
        let (a, b) = (ProjectId::random(), ProjectId::random());
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_reorder()
            .withf(move |ids| ids.to_vec() == vec![b, a])
            .times(1)
            .returning(|_| Ok(()));

        let body = serde_json::json!({ "ids": [b, a] }).to_string();
        let (status, json) = send(
            admin_with(catalog),
            json_request("PUT", "/projects/order", &body),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(json, serde_json::json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_reorder_rejects_repeats() {
        let a = ProjectId::random();
        let body = serde_json::json!({ "ids": [a, a] }).to_string();

        let (status, json) = send(
            admin_with(MockProjectCatalog::new()),
            json_request("PUT", "/projects/order", &body),
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(json["error"], "Project ids must not repeat");
    }

    #[tokio::test]
    async fn test_reorder_unknown_id_is_not_found() {
        let mut catalog = MockProjectCatalog::new();
        catalog
            .expect_reorder()
            .returning(|_| Err(RepositoryError::NotFound));

        let body = serde_json::json!({ "ids": [ProjectId::random()] }).to_string();
        let (status, _) = send(
            admin_with(catalog),
            json_request("PUT", "/projects/order", &body),
        )
        .await;

        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_reorder_requires_admin() {
        let (status, _) = send(
            public_app(MockProjectCatalog::new()),
            json_request("PUT", "/projects/order", r#"{"ids":[]}"#),
        )
        .await;

        assert_eq!(status, 401);
    }
}
