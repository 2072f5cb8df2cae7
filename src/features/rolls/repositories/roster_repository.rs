use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::rolls::models::{RollAssignment, RosterStudent};

#[async_trait]
pub trait RosterRepository: Send + Sync + 'static {
    async fn batch_exists(&self, batch_id: Uuid) -> Result<bool>;

    async fn list_batch_students(&self, batch_id: Uuid) -> Result<Vec<RosterStudent>>;

    /// Write all assignments atomically. On failure nothing is written and
    /// the error names the student whose update failed.
    async fn apply_rolls(&self, assignments: &[RollAssignment]) -> Result<usize>;
}

/// Error for a roll write that aborted the whole batch
pub fn roll_update_failed(student_id: Uuid, cause: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!(
        "Roll update failed for student {}, no rolls were changed: {}",
        student_id, cause
    ))
}

#[derive(Debug, Clone)]
pub struct PgRosterRepository {
    pool: PgPool,
}

impl PgRosterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PgRosterRepository {
    async fn batch_exists(&self, batch_id: Uuid) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM batches WHERE id = $1)")
            .bind(batch_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_batch_students(&self, batch_id: Uuid) -> Result<Vec<RosterStudent>> {
        sqlx::query_as::<_, RosterStudent>(
            "SELECT id, full_name, roll FROM students WHERE batch_id = $1",
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch students of batch {}: {:?}", batch_id, e);
            AppError::Database(e)
        })
    }

    async fn apply_rolls(&self, assignments: &[RollAssignment]) -> Result<usize> {
        if assignments.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        for assignment in assignments {
            sqlx::query("UPDATE students SET roll = $1 WHERE id = $2")
                .bind(&assignment.roll)
                .bind(assignment.student_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to update roll for student {}: {:?}",
                        assignment.student_id,
                        e
                    );
                    roll_update_failed(assignment.student_id, e)
                })?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit roll updates: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(assignments.len())
    }
}
