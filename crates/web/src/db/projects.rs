//! Project repository for the gallery.
//!
//! Gallery order is `sort_order`, then newest `created_at`, then `id`, so
//! rows that share a position still list deterministically.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use woodshop_core::ProjectId;

use super::RepositoryError;
use crate::models::Project;
use crate::services::projects::{
    ProjectCatalog, ProjectChanges, ProjectDraft, ProjectFacets, ProjectFilter, TagFilter,
    assign_positions,
};
use crate::services::reconciler::ProjectFolderSource;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    cloudinary_folder: Option<String>,
    cover_image: Option<String>,
    tags: Vec<String>,
    created_at: NaiveDate,
    date_is_month_only: bool,
    sort_order: i32,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::new(row.id),
            title: row.title,
            description: row.description,
            cloudinary_folder: row.cloudinary_folder,
            cover_image: row.cover_image,
            tags: row.tags,
            created_at: row.created_at,
            date_is_month_only: row.date_is_month_only,
            sort_order: row.sort_order,
            updated_at: row.updated_at,
        }
    }
}

const PROJECT_COLUMNS: &str = "id, title, description, cloudinary_folder, cover_image, tags, \
     created_at, date_is_month_only, sort_order, updated_at";

const GALLERY_ORDER: &str = "ORDER BY sort_order, created_at DESC, id";

/// `$1` tag, `$2` untagged only, `$3` year.
const FILTER_CLAUSE: &str = "WHERE ($1::TEXT IS NULL OR $1 = ANY(tags)) \
     AND (NOT $2 OR cardinality(tags) = 0) \
     AND ($3::INT IS NULL OR EXTRACT(YEAR FROM created_at)::INT = $3)";

/// Bind values for [`FILTER_CLAUSE`].
fn filter_binds(filter: &ProjectFilter) -> (Option<&str>, bool, Option<i32>) {
    match &filter.tag {
        TagFilter::Any => (None, false, filter.year),
        TagFilter::Untagged => (None, true, filter.year),
        TagFilter::Tag(tag) => (Some(tag.as_str()), false, filter.year),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the `projects` table.
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectCatalog for ProjectRepository {
    async fn list(
        &self,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, u64), RepositoryError> {
        let (tag, untagged, year) = filter_binds(filter);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM projects {FILTER_CLAUSE}"
        ))
        .bind(tag)
        .bind(untagged)
        .bind(year)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects {FILTER_CLAUSE} {GALLERY_ORDER} \
             LIMIT $4 OFFSET $5"
        ))
        .bind(tag)
        .bind(untagged)
        .bind(year)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((
            rows.into_iter().map(Project::from).collect(),
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn list_in_order(&self, year: Option<i32>) -> Result<Vec<Project>, RepositoryError> {
        let filter = ProjectFilter {
            tag: TagFilter::Any,
            year,
        };
        let (tag, untagged, year) = filter_binds(&filter);

        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects {FILTER_CLAUSE} {GALLERY_ORDER}"
        ))
        .bind(tag)
        .bind(untagged)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn facets(&self) -> Result<ProjectFacets, RepositoryError> {
        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT tag FROM projects, unnest(tags) AS tag ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?;

        let years: Vec<i32> = sqlx::query_scalar(
            "SELECT DISTINCT EXTRACT(YEAR FROM created_at)::INT AS year FROM projects \
             ORDER BY year DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ProjectFacets { tags, years })
    }

    async fn get(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Project::from))
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<Project, RepositoryError> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r"
            INSERT INTO projects
                (id, title, description, cloudinary_folder, cover_image, tags,
                 created_at, date_is_month_only, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                    (SELECT COALESCE(MIN(sort_order), 0) - 1 FROM projects))
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(ProjectId::random().as_uuid())
        .bind(&draft.title)
        .bind(draft.description.as_deref())
        .bind(draft.cloudinary_folder.as_ref().map(|f| f.as_str()))
        .bind(draft.cover_image.as_deref())
        .bind(&draft.tags)
        .bind(draft.created_at)
        .bind(draft.date_is_month_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        id: ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, RepositoryError> {
        // Nullable columns take a "set" flag so an explicit null clears them.
        // The date is re-truncated whenever the month-only flag ends up set.
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            r"
            UPDATE projects SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                cloudinary_folder = CASE WHEN $5 THEN $6 ELSE cloudinary_folder END,
                cover_image = CASE WHEN $7 THEN $8 ELSE cover_image END,
                tags = COALESCE($9, tags),
                date_is_month_only = COALESCE($11, date_is_month_only),
                created_at = CASE
                    WHEN COALESCE($11, date_is_month_only)
                        THEN date_trunc('month', COALESCE($10, created_at))::DATE
                    ELSE COALESCE($10, created_at)
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(changes.title.as_deref())
        .bind(changes.description.is_some())
        .bind(changes.description.clone().flatten())
        .bind(changes.cloudinary_folder.is_some())
        .bind(
            changes
                .cloudinary_folder
                .clone()
                .flatten()
                .map(String::from),
        )
        .bind(changes.cover_image.is_some())
        .bind(changes.cover_image.clone().flatten())
        .bind(changes.tags.as_deref())
        .bind(changes.created_at)
        .bind(changes.date_is_month_only)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Project::from))
    }

    async fn delete(&self, id: ProjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, ids: &[ProjectId]) -> Result<(), RepositoryError> {
        let uuids: Vec<Uuid> = ids.iter().map(ProjectId::as_uuid).collect();

        let mut tx = self.pool.begin().await?;

        let current: Vec<i32> = sqlx::query_scalar(
            "SELECT sort_order FROM projects WHERE id = ANY($1) FOR UPDATE",
        )
        .bind(&uuids)
        .fetch_all(&mut *tx)
        .await?;

        if current.len() != ids.len() {
            return Err(RepositoryError::NotFound);
        }

        let (ordered, positions): (Vec<Uuid>, Vec<i32>) = assign_positions(&current, ids)
            .into_iter()
            .map(|(id, position)| (id.as_uuid(), position))
            .unzip();

        sqlx::query(
            r"
            UPDATE projects p SET sort_order = v.position, updated_at = NOW()
            FROM UNNEST($1::UUID[], $2::INT[]) AS v(id, position)
            WHERE p.id = v.id
            ",
        )
        .bind(&ordered)
        .bind(&positions)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectFolderSource for ProjectRepository {
    async fn list_folder_references(&self) -> Result<Vec<String>, RepositoryError> {
        let folders: Vec<String> = sqlx::query_scalar(
            "SELECT cloudinary_folder FROM projects WHERE cloudinary_folder IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(folders
            .into_iter()
            .map(|folder| folder.trim().to_owned())
            .filter(|folder| !folder.is_empty())
            .collect())
    }
}
