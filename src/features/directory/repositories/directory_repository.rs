use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::directory::models::{StudentAffiliation, TeachingAffiliation, UserSummary};

/// Lookups against the hosted directory tables
#[async_trait]
pub trait DirectoryRepository: Send + Sync + 'static {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserSummary>>;

    /// Profiles for a set of ids; unknown ids are skipped
    async fn find_users(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>>;

    async fn student_affiliation(&self, student_id: Uuid) -> Result<Option<StudentAffiliation>>;

    async fn teaching_affiliations(&self, teacher_id: Uuid) -> Result<Vec<TeachingAffiliation>>;
}

#[derive(Debug, Clone)]
pub struct PgDirectoryRepository {
    pool: PgPool,
}

impl PgDirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryRepository for PgDirectoryRepository {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, full_name, email, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user {}: {:?}", user_id, e);
            AppError::Database(e)
        })
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, UserSummary>(
            "SELECT id, full_name, email, role FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch users: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn student_affiliation(&self, student_id: Uuid) -> Result<Option<StudentAffiliation>> {
        sqlx::query_as::<_, StudentAffiliation>(
            r#"
            SELECT s.id AS student_id, s.batch_id, b.course_id, b.academic_unit AS semester
            FROM students s
            LEFT JOIN batches b ON b.id = s.batch_id
            WHERE s.id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn teaching_affiliations(&self, teacher_id: Uuid) -> Result<Vec<TeachingAffiliation>> {
        sqlx::query_as::<_, TeachingAffiliation>(
            r#"
            SELECT ta.teacher_id, ta.batch_id, b.course_id
            FROM teaching_assignments ta
            JOIN batches b ON b.id = ta.batch_id
            WHERE ta.teacher_id = $1
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to fetch teaching assignments for {}: {:?}",
                teacher_id,
                e
            );
            AppError::Database(e)
        })
    }
}
