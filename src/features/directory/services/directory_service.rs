use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::directory::models::{
    Actor, StudentAffiliation, TeachingAffiliation, UserSummary,
};
use crate::features::directory::repositories::DirectoryRepository;

/// Role and affiliation resolution for the notice and roster features
pub struct DirectoryService {
    repository: Arc<dyn DirectoryRepository>,
}

impl DirectoryService {
    pub fn new(repository: Arc<dyn DirectoryRepository>) -> Self {
        Self { repository }
    }

    /// Resolve the campus role of an authenticated caller.
    ///
    /// A valid token without a directory profile is refused: the caller exists
    /// in the auth service but has no standing on campus.
    pub async fn resolve_actor(&self, user: &AuthenticatedUser) -> Result<Actor> {
        let profile = self.repository.find_user(user.user_id).await?.ok_or_else(|| {
            tracing::warn!("Authenticated user {} has no campus profile", user.user_id);
            AppError::Forbidden("No campus profile for this account".to_string())
        })?;

        Ok(Actor::from(&profile))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserSummary> {
        self.repository
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn get_users(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        self.repository.find_users(user_ids).await
    }

    /// Affiliation of a student for audience matching.
    ///
    /// Never fails: a lookup error or a missing row yields an unassigned
    /// affiliation so the student still sees campus-wide notices.
    pub async fn student_affiliation(&self, student_id: Uuid) -> StudentAffiliation {
        match self.repository.student_affiliation(student_id).await {
            Ok(Some(affiliation)) => affiliation,
            Ok(None) => {
                tracing::debug!("No affiliation row for student {}", student_id);
                StudentAffiliation::unassigned(student_id)
            }
            Err(e) => {
                tracing::warn!(
                    "Affiliation lookup failed for student {}, using unassigned: {}",
                    student_id,
                    e
                );
                StudentAffiliation::unassigned(student_id)
            }
        }
    }

    pub async fn teaching_affiliations(&self, teacher_id: Uuid) -> Result<Vec<TeachingAffiliation>> {
        self.repository.teaching_affiliations(teacher_id).await
    }
}
