//! Portfolio projects shown in the gallery.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use woodshop_core::ProjectId;

/// A saved gallery project.
///
/// `created_at` is the date the piece was made, not when the row was
/// inserted. When `date_is_month_only` is set only its month and year are
/// meaningful and the day is always the 1st.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub cloudinary_folder: Option<String>,
    pub cover_image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: NaiveDate,
    pub date_is_month_only: bool,
    pub sort_order: i32,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Human-readable date: `February 2026` for month-only dates,
    /// `February 15, 2026` otherwise.
    #[must_use]
    pub fn display_date(&self) -> String {
        if self.date_is_month_only {
            self.created_at.format("%B %Y").to_string()
        } else {
            self.created_at.format("%B %-d, %Y").to_string()
        }
    }
}

/// A project as returned by the API, with its display date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub display_date: String,
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        Self {
            display_date: project.display_date(),
            project,
        }
    }
}
