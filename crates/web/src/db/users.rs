//! User repository for database operations.
//!
//! Users are created at their first Google sign-in and never deleted here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use woodshop_core::{Email, UserId};

use super::RepositoryError;
use crate::models::{AdminFlag, User};
use crate::services::auth::{SignInProfile, UserDirectory};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    image: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id),
            email: parse_email(&row.email)?,
            name: row.name,
            image: row.image,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminFlagRow {
    id: Uuid,
    email: String,
    is_admin: bool,
}

impl TryFrom<AdminFlagRow> for AdminFlag {
    type Error = RepositoryError;

    fn try_from(row: AdminFlagRow) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(row.id),
            email: parse_email(&row.email)?,
            is_admin: row.is_admin,
        })
    }
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

const USER_COLUMNS: &str = "id, email, name, image, is_admin, created_at, updated_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every user flagged as admin, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_admins(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_admin ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Insert or update a user and flag them as admin.
    ///
    /// Profile fields that are `None` keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_admin(&self, profile: &SignInProfile) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (id, email, name, image, is_admin)
            VALUES ($1, $2, $3, $4, TRUE)
            ON CONFLICT (email) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, users.name),
                image = COALESCE(EXCLUDED.image, users.image),
                is_admin = TRUE,
                updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(UserId::random().as_uuid())
        .bind(profile.email.as_str())
        .bind(profile.name.as_deref())
        .bind(profile.image.as_deref())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Clear the admin flag for an email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke_admin(&self, email: &Email) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET is_admin = FALSE, updated_at = NOW() WHERE email = $1",
        )
        .bind(email.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_admin_flag_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<AdminFlag>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminFlagRow>(
            "SELECT id, email, is_admin FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_admin_flag_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AdminFlag>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminFlagRow>(
            "SELECT id, email, is_admin FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn record_admin_sign_in(
        &self,
        profile: &SignInProfile,
    ) -> Result<User, RepositoryError> {
        self.upsert_admin(profile).await
    }
}
