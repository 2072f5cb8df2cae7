use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notices::models::{NewNotice, Notice, NoticeRead};
use crate::features::notices::services::visibility::VisibilityFilter;

const NOTICE_COLUMNS: &str = "id, title, message, attachment_url, target_type, target_value, \
     is_pinned, created_by, created_at, updated_at, expires_at";

/// Taken before deleting a notice so no read marker can be added mid-delete
const LOCK_NOTICE_SQL: &str = "SELECT id FROM notices WHERE id = $1 FOR UPDATE";

/// Persistence for notices and their read markers
#[async_trait]
pub trait NoticeRepository: Send + Sync + 'static {
    async fn insert(&self, notice: &NewNotice) -> Result<Notice>;

    async fn find_by_id(&self, notice_id: Uuid) -> Result<Option<Notice>>;

    /// Unordered; callers apply the listing order
    async fn list_visible(&self, filter: &VisibilityFilter, now: DateTime<Utc>)
        -> Result<Vec<Notice>>;

    /// Visible notices `user_id` has no read marker for
    async fn count_unread(
        &self,
        filter: &VisibilityFilter,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64>;

    /// Overwrite every mutable column of an existing notice
    async fn update(&self, notice: &Notice) -> Result<Option<Notice>>;

    /// Remove the notice and all of its read markers atomically.
    /// Returns false if the notice did not exist.
    async fn delete_with_reads(&self, notice_id: Uuid) -> Result<bool>;

    /// Which of `notice_ids` the user has read, in one lookup
    async fn read_notice_ids(&self, user_id: Uuid, notice_ids: &[Uuid]) -> Result<HashSet<Uuid>>;

    async fn find_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<Option<NoticeRead>>;

    async fn list_reads(&self, notice_id: Uuid) -> Result<Vec<NoticeRead>>;

    /// Insert or refresh the read marker for (notice, user)
    async fn upsert_read(
        &self,
        notice_id: Uuid,
        user_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<NoticeRead>;

    /// Returns false if there was no marker
    async fn delete_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct PgNoticeRepository {
    pool: PgPool,
}

impl PgNoticeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoticeRepository for PgNoticeRepository {
    async fn insert(&self, notice: &NewNotice) -> Result<Notice> {
        let query = format!(
            r#"
            INSERT INTO notices (title, message, attachment_url, target_type, target_value, is_pinned, created_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            NOTICE_COLUMNS
        );

        sqlx::query_as::<_, Notice>(&query)
            .bind(&notice.title)
            .bind(&notice.message)
            .bind(&notice.attachment_url)
            .bind(notice.target.target_type())
            .bind(notice.target.value())
            .bind(notice.is_pinned)
            .bind(notice.created_by)
            .bind(notice.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert notice: {:?}", e);
                AppError::from_db(e, &format!("User {} not found", notice.created_by))
            })
    }

    async fn find_by_id(&self, notice_id: Uuid) -> Result<Option<Notice>> {
        let query = format!("SELECT {} FROM notices WHERE id = $1", NOTICE_COLUMNS);

        sqlx::query_as::<_, Notice>(&query)
            .bind(notice_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch notice {}: {:?}", notice_id, e);
                AppError::Database(e)
            })
    }

    async fn list_visible(
        &self,
        filter: &VisibilityFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notice>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM notices", NOTICE_COLUMNS));
        filter.push_where(&mut qb, now);

        qb.build_query_as::<Notice>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list visible notices: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn count_unread(
        &self,
        filter: &VisibilityFilter,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM notices");
        filter.push_where(&mut qb, now);
        qb.push(
            " AND NOT EXISTS (SELECT 1 FROM notice_reads r WHERE r.notice_id = notices.id AND r.user_id = ",
        )
        .push_bind(user_id)
        .push(")");

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count unread notices for {}: {:?}", user_id, e);
                AppError::Database(e)
            })
    }

    async fn update(&self, notice: &Notice) -> Result<Option<Notice>> {
        let query = format!(
            r#"
            UPDATE notices
            SET title = $2, message = $3, attachment_url = $4, target_type = $5,
                target_value = $6, is_pinned = $7, expires_at = $8, updated_at = $9
            WHERE id = $1
            RETURNING {}
            "#,
            NOTICE_COLUMNS
        );

        sqlx::query_as::<_, Notice>(&query)
            .bind(notice.id)
            .bind(&notice.title)
            .bind(&notice.message)
            .bind(&notice.attachment_url)
            .bind(notice.target_type)
            .bind(&notice.target_value)
            .bind(notice.is_pinned)
            .bind(notice.expires_at)
            .bind(notice.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update notice {}: {:?}", notice.id, e);
                AppError::Database(e)
            })
    }

    async fn delete_with_reads(&self, notice_id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Concurrent read upserts wait on this lock, then fail the foreign key
        let locked = sqlx::query_scalar::<_, Uuid>(LOCK_NOTICE_SQL)
            .bind(notice_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to lock notice {}: {:?}", notice_id, e);
                AppError::Database(e)
            })?;
        if locked.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM notice_reads WHERE notice_id = $1")
            .bind(notice_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete reads of notice {}: {:?}", notice_id, e);
                AppError::Database(e)
            })?;

        let result = sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(notice_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete notice {}: {:?}", notice_id, e);
                AppError::Database(e)
            })?;

        tx.commit().await.map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn read_notice_ids(&self, user_id: Uuid, notice_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        if notice_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT notice_id FROM notice_reads WHERE user_id = $1 AND notice_id = ANY($2)",
        )
        .bind(user_id)
        .bind(notice_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch read markers for {}: {:?}", user_id, e);
            AppError::Database(e)
        })?;

        Ok(ids.into_iter().collect())
    }

    async fn find_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<Option<NoticeRead>> {
        sqlx::query_as::<_, NoticeRead>(
            "SELECT notice_id, user_id, read_at FROM notice_reads WHERE notice_id = $1 AND user_id = $2",
        )
        .bind(notice_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_reads(&self, notice_id: Uuid) -> Result<Vec<NoticeRead>> {
        sqlx::query_as::<_, NoticeRead>(
            r#"
            SELECT notice_id, user_id, read_at
            FROM notice_reads
            WHERE notice_id = $1
            ORDER BY read_at DESC
            "#,
        )
        .bind(notice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reads of notice {}: {:?}", notice_id, e);
            AppError::Database(e)
        })
    }

    async fn upsert_read(
        &self,
        notice_id: Uuid,
        user_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<NoticeRead> {
        sqlx::query_as::<_, NoticeRead>(
            r#"
            INSERT INTO notice_reads (notice_id, user_id, read_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (notice_id, user_id) DO UPDATE SET read_at = EXCLUDED.read_at
            RETURNING notice_id, user_id, read_at
            "#,
        )
        .bind(notice_id)
        .bind(user_id)
        .bind(read_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(
                "Failed to mark notice {} read for {}: {:?}",
                notice_id,
                user_id,
                e
            );
            AppError::from_db(e, "Notice not found")
        })
    }

    async fn delete_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM notice_reads WHERE notice_id = $1 AND user_id = $2")
                .bind(notice_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to unmark notice {} for {}: {:?}",
                        notice_id,
                        user_id,
                        e
                    );
                    AppError::Database(e)
                })?;

        Ok(result.rows_affected() > 0)
    }
}
