//! Project gallery: filters, pagination, validation of admin edits and
//! reordering.
//!
//! Storage sits behind [`ProjectCatalog`]; everything else here is pure so the
//! rules can be tested without a database.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use woodshop_core::{FolderName, ProjectId};

use crate::db::RepositoryError;
use crate::models::{Project, ProjectView};

/// Projects per gallery page.
pub const PAGE_SIZE: u32 = 6;

/// Tag filter value selecting projects without any tag.
pub const TAG_NONE: &str = "__none__";

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 20_000;
const MAX_TAG_CHARS: usize = 50;
const MAX_TAGS: usize = 20;

/// Which tags a gallery listing includes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TagFilter {
    /// Every project.
    #[default]
    Any,
    /// Projects with no tags.
    Untagged,
    /// Projects carrying this tag.
    Tag(String),
}

impl TagFilter {
    /// Read the `tag` query parameter. Blank means no filter.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::Any,
            Some(TAG_NONE) => Self::Untagged,
            Some(tag) => Self::Tag(tag.to_owned()),
        }
    }
}

/// Gallery listing filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectFilter {
    pub tag: TagFilter,
    pub year: Option<i32>,
}

/// Row offset of a 1-based page.
#[must_use]
pub fn page_offset(page: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(PAGE_SIZE)
}

/// One page of the gallery.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPage {
    pub projects: Vec<ProjectView>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub has_more: bool,
}

impl ProjectPage {
    /// Wrap the rows of `page` out of `total` matching projects.
    #[must_use]
    pub fn new(projects: Vec<Project>, page: u32, total: u64) -> Self {
        let seen = u64::from(page) * u64::from(PAGE_SIZE);
        Self {
            projects: projects.into_iter().map(ProjectView::from).collect(),
            page,
            page_size: PAGE_SIZE,
            total,
            has_more: seen < total,
        }
    }
}

/// Values the gallery filter controls offer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFacets {
    /// Every tag in use, alphabetical.
    pub tags: Vec<String>,
    /// Every project year, newest first.
    pub years: Vec<i32>,
}

/// A validated new project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub description: Option<String>,
    pub cloudinary_folder: Option<FolderName>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: NaiveDate,
    pub date_is_month_only: bool,
}

/// A validated partial update. `None` leaves a field alone; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub cloudinary_folder: Option<Option<FolderName>>,
    pub cover_image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<NaiveDate>,
    pub date_is_month_only: Option<bool>,
}

impl ProjectChanges {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Persisted project storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    /// Projects matching `filter` in gallery order, `limit` rows from
    /// `offset`, plus the total number of matches.
    async fn list(
        &self,
        filter: &ProjectFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, u64), RepositoryError>;

    /// Every project, optionally only one year, in gallery order.
    async fn list_in_order(&self, year: Option<i32>) -> Result<Vec<Project>, RepositoryError>;

    /// Tags and years in use.
    async fn facets(&self) -> Result<ProjectFacets, RepositoryError>;

    async fn get(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;

    /// Insert a project ahead of every existing one.
    async fn create(&self, draft: &ProjectDraft) -> Result<Project, RepositoryError>;

    /// `Ok(None)` when no project has this id.
    async fn update(
        &self,
        id: ProjectId,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, RepositoryError>;

    /// `Ok(false)` when no project has this id.
    async fn delete(&self, id: ProjectId) -> Result<bool, RepositoryError>;

    /// Rearrange `ids` into the given order. Fails with
    /// `RepositoryError::NotFound` if any id is unknown.
    async fn reorder(&self, ids: &[ProjectId]) -> Result<(), RepositoryError>;
}

/// Give `new_order` the sort positions its projects hold now.
///
/// The current positions are sorted and handed out in the new order, so
/// projects outside the set keep their places. Ties are spread so the result
/// is strictly increasing.
#[must_use]
pub fn assign_positions(current: &[i32], new_order: &[ProjectId]) -> Vec<(ProjectId, i32)> {
    let mut slots = current.to_vec();
    slots.sort_unstable();

    let mut previous: Option<i32> = None;
    for slot in &mut slots {
        if let Some(prev) = previous {
            *slot = (*slot).max(prev.saturating_add(1));
        }
        previous = Some(*slot);
    }

    new_order.iter().copied().zip(slots).collect()
}

/// Check a reorder request: non-empty, no repeats.
///
/// # Errors
///
/// Returns a message suitable for a 400 response.
pub fn validate_order(ids: &[ProjectId]) -> Result<(), &'static str> {
    if ids.is_empty() {
        return Err("At least one project id is required");
    }
    let mut seen = HashSet::with_capacity(ids.len());
    if !ids.iter().all(|id| seen.insert(*id)) {
        return Err("Project ids must not repeat");
    }
    Ok(())
}

// =============================================================================
// Request bodies
// =============================================================================

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Body of `POST /projects`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cloudinary_folder: Option<String>,
    pub cover_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<NaiveDate>,
    #[serde(default)]
    pub date_is_month_only: bool,
}

/// Body of `PATCH /projects/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cloudinary_folder: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub cover_image: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<NaiveDate>,
    pub date_is_month_only: Option<bool>,
}

fn clean_title(raw: &str) -> Result<String, String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err("Title is required".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title must be at most {MAX_TITLE_CHARS} characters"));
    }
    Ok(title.to_owned())
}

fn clean_text(raw: Option<String>) -> Result<Option<String>, String> {
    let text = raw.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty());
    if text
        .as_deref()
        .is_some_and(|t| t.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
        ));
    }
    Ok(text)
}

fn clean_folder(namespace: &str, raw: Option<String>) -> Result<Option<FolderName>, String> {
    raw.filter(|f| !f.trim().is_empty())
        .map(|f| FolderName::qualified(namespace, &f))
        .transpose()
        .map_err(|e| format!("Invalid folder: {e}"))
}

/// Trim, drop blanks and repeats, keep first-seen order.
fn clean_tags(raw: Vec<String>) -> Result<Vec<String>, String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw {
        let tag = tag.trim();
        if tag.is_empty() || tags.iter().any(|t| t == tag) {
            continue;
        }
        if tag == TAG_NONE {
            return Err(format!("{TAG_NONE} is reserved"));
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(format!("Tags must be at most {MAX_TAG_CHARS} characters"));
        }
        tags.push(tag.to_owned());
    }
    if tags.len() > MAX_TAGS {
        return Err(format!("At most {MAX_TAGS} tags are allowed"));
    }
    Ok(tags)
}

/// Month-only dates are stored on the 1st.
fn normalize_date(date: NaiveDate, month_only: bool) -> NaiveDate {
    if month_only {
        date.with_day(1).unwrap_or(date)
    } else {
        date
    }
}

impl CreateProjectRequest {
    /// Validate into a draft. Folders are placed under `namespace`; a missing
    /// date defaults to `today`.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for a 400 response.
    pub fn into_draft(self, namespace: &str, today: NaiveDate) -> Result<ProjectDraft, String> {
        let title = clean_title(self.title.as_deref().unwrap_or_default())?;
        Ok(ProjectDraft {
            title,
            description: clean_text(self.description)?,
            cloudinary_folder: clean_folder(namespace, self.cloudinary_folder)?,
            cover_image: clean_text(self.cover_image)?,
            tags: clean_tags(self.tags)?,
            created_at: normalize_date(
                self.created_at.unwrap_or(today),
                self.date_is_month_only,
            ),
            date_is_month_only: self.date_is_month_only,
        })
    }
}

impl UpdateProjectRequest {
    /// Validate into a change set.
    ///
    /// A new date is normalized with the new month-only flag when one is
    /// sent; turning the flag on without a new date is applied by the
    /// repository against the stored date.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for a 400 response.
    pub fn into_changes(self, namespace: &str) -> Result<ProjectChanges, String> {
        let changes = ProjectChanges {
            title: self.title.as_deref().map(clean_title).transpose()?,
            description: self.description.map(clean_text).transpose()?,
            cloudinary_folder: self
                .cloudinary_folder
                .map(|f| clean_folder(namespace, f))
                .transpose()?,
            cover_image: self.cover_image.map(clean_text).transpose()?,
            tags: self.tags.map(clean_tags).transpose()?,
            created_at: self
                .created_at
                .map(|d| normalize_date(d, self.date_is_month_only.unwrap_or(false))),
            date_is_month_only: self.date_is_month_only,
        };
        if changes.is_empty() {
            return Err("No changes".to_string());
        }
        Ok(changes)
    }
}
