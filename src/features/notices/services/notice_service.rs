use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::directory::models::{Actor, UserRole, UserSummary};
use crate::features::directory::DirectoryService;
use crate::features::notices::dtos::{
    CreateNoticeDto, NoticeDetailDto, NoticeResponseDto, ReadReceiptDto, ReadStatusDto,
    UnreadCountDto, UpdateNoticeDto,
};
use crate::features::notices::models::{Notice, NoticeTarget};
use crate::features::notices::repositories::NoticeRepository;
use crate::features::notices::services::authorization::{self, TargetPermission};
use crate::features::notices::services::visibility::{sort_for_listing, Viewer, VisibilityFilter};

pub struct NoticeService {
    repository: Arc<dyn NoticeRepository>,
    directory: Arc<DirectoryService>,
}

impl NoticeService {
    pub fn new(repository: Arc<dyn NoticeRepository>, directory: Arc<DirectoryService>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    /// Resolve the caller's campus role
    pub async fn actor(&self, user: &AuthenticatedUser) -> Result<Actor> {
        self.directory.resolve_actor(user).await
    }

    /// Build the audience a listing is computed for.
    ///
    /// For students the affiliation of `student_id` (default: the actor) is used.
    async fn viewer(&self, actor: &Actor, student_id: Option<Uuid>) -> Viewer {
        match actor.role {
            UserRole::Admin => Viewer::Admin,
            UserRole::Teacher => Viewer::Teacher {
                teacher_id: actor.user_id,
            },
            UserRole::Student => {
                let student_id = student_id.unwrap_or(actor.user_id);
                Viewer::Student(self.directory.student_affiliation(student_id).await)
            }
        }
    }

    /// Non-expired notices visible to the actor, pinned first then newest,
    /// each with the actor's read state and the author's profile
    pub async fn list_visible(
        &self,
        actor: &Actor,
        student_id: Option<Uuid>,
    ) -> Result<Vec<NoticeResponseDto>> {
        let viewer = self.viewer(actor, student_id).await;
        let filter = VisibilityFilter::for_viewer(&viewer);

        let mut notices = self.repository.list_visible(&filter, Utc::now()).await?;
        sort_for_listing(&mut notices);

        let ids: Vec<Uuid> = notices.iter().map(|n| n.id).collect();
        let read = self.repository.read_notice_ids(actor.user_id, &ids).await?;
        let authors = self.authors_of(&notices).await?;

        Ok(notices
            .into_iter()
            .map(|n| {
                let is_read = read.contains(&n.id);
                let author = authors.get(&n.created_by).cloned();
                NoticeResponseDto::from_notice(n, is_read, author)
            })
            .collect())
    }

    /// Profiles of the distinct authors of `notices`, fetched in one lookup
    async fn authors_of(&self, notices: &[Notice]) -> Result<HashMap<Uuid, UserSummary>> {
        let author_ids: Vec<Uuid> = notices
            .iter()
            .map(|n| n.created_by)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .directory
            .get_users(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect())
    }

    async fn author_of(&self, notice: &Notice) -> Result<Option<UserSummary>> {
        Ok(self
            .directory
            .get_users(&[notice.created_by])
            .await?
            .into_iter()
            .next())
    }

    pub async fn count_unread(&self, actor: &Actor) -> Result<UnreadCountDto> {
        let viewer = self.viewer(actor, None).await;
        let filter = VisibilityFilter::for_viewer(&viewer);

        let unread = self
            .repository
            .count_unread(&filter, actor.user_id, Utc::now())
            .await?;

        Ok(UnreadCountDto { unread })
    }

    /// Notice detail. A notice outside the actor's audience is reported as missing.
    pub async fn get_notice(&self, actor: &Actor, notice_id: Uuid) -> Result<NoticeDetailDto> {
        let notice = self.find_notice(notice_id).await?;

        let viewer = self.viewer(actor, None).await;
        if !VisibilityFilter::for_viewer(&viewer).matches(&notice, Utc::now()) {
            return Err(not_found(notice_id));
        }

        let own_read = self.repository.find_read(notice_id, actor.user_id).await?;

        let reads = if authorization::can_view_receipts(actor, &notice) {
            Some(self.read_receipts(notice_id).await?)
        } else {
            None
        };

        let author = self.author_of(&notice).await?;

        Ok(NoticeDetailDto {
            notice: NoticeResponseDto::from_notice(notice, own_read.is_some(), author),
            read_at: own_read.map(|r| r.read_at),
            reads,
        })
    }

    async fn read_receipts(&self, notice_id: Uuid) -> Result<Vec<ReadReceiptDto>> {
        let reads = self.repository.list_reads(notice_id).await?;
        let user_ids: Vec<Uuid> = reads.iter().map(|r| r.user_id).collect();
        let users: HashMap<Uuid, _> = self
            .directory
            .get_users(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(reads
            .into_iter()
            .map(|r| {
                let user = users.get(&r.user_id);
                ReadReceiptDto::new(r, user)
            })
            .collect())
    }

    pub async fn create(&self, actor: &Actor, dto: CreateNoticeDto) -> Result<NoticeResponseDto> {
        let new_notice = dto.into_new_notice(Utc::now())?;

        authorization::ensure_can_author_as(actor, new_notice.created_by)?;
        self.ensure_can_target(actor, &new_notice.target).await?;

        let author = self.directory.get_user(new_notice.created_by).await?;

        let notice = self.repository.insert(&new_notice).await?;

        tracing::info!(
            "Notice {} created by {} for {} {}",
            notice.id,
            notice.created_by,
            notice.target_type,
            notice.target_value.as_deref().unwrap_or("-")
        );

        Ok(NoticeResponseDto::from_notice(notice, false, Some(author)))
    }

    /// Partial update by the notice's creator or an admin. A changed target
    /// goes through the same checks as on creation.
    pub async fn update(
        &self,
        actor: &Actor,
        notice_id: Uuid,
        dto: UpdateNoticeDto,
    ) -> Result<NoticeResponseDto> {
        let mut notice = self.find_notice(notice_id).await?;
        authorization::ensure_can_modify(actor, &notice, "update")?;

        let changes = dto.into_changes(&notice)?;
        if let Some(target) = &changes.target {
            let current = notice.target().map_err(|e| {
                AppError::Internal(format!(
                    "Notice {} has an invalid stored target: {}",
                    notice_id, e
                ))
            })?;
            if *target != current {
                self.ensure_can_target(actor, target).await?;
            }
        }

        notice.apply(changes);
        notice.updated_at = Utc::now();

        let updated = self
            .repository
            .update(&notice)
            .await?
            .ok_or_else(|| not_found(notice_id))?;

        let is_read = self
            .repository
            .find_read(notice_id, actor.user_id)
            .await?
            .is_some();

        let author = self.author_of(&updated).await?;

        tracing::info!("Notice {} updated by {}", notice_id, actor.user_id);

        Ok(NoticeResponseDto::from_notice(updated, is_read, author))
    }

    /// Delete a notice together with its read markers
    pub async fn delete(&self, actor: &Actor, notice_id: Uuid) -> Result<()> {
        let notice = self.find_notice(notice_id).await?;
        authorization::ensure_can_modify(actor, &notice, "delete")?;

        if !self.repository.delete_with_reads(notice_id).await? {
            return Err(not_found(notice_id));
        }

        tracing::info!("Notice {} deleted by {}", notice_id, actor.user_id);

        Ok(())
    }

    /// Idempotent; a repeat read refreshes `read_at`
    pub async fn mark_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<ReadStatusDto> {
        self.find_notice(notice_id).await?;

        let read = self
            .repository
            .upsert_read(notice_id, user_id, Utc::now())
            .await?;

        tracing::debug!("Notice {} marked read by {}", notice_id, user_id);

        Ok(read.into())
    }

    /// No-op if the notice was not marked read
    pub async fn unmark_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<()> {
        if self.repository.delete_read(notice_id, user_id).await? {
            tracing::debug!("Notice {} marked unread by {}", notice_id, user_id);
        }
        Ok(())
    }

    async fn find_notice(&self, notice_id: Uuid) -> Result<Notice> {
        self.repository
            .find_by_id(notice_id)
            .await?
            .ok_or_else(|| not_found(notice_id))
    }

    async fn ensure_can_target(&self, actor: &Actor, target: &NoticeTarget) -> Result<()> {
        match authorization::target_permission(actor, target)? {
            TargetPermission::Allowed => Ok(()),
            TargetPermission::RequiresAssignment => {
                let assignments = self.directory.teaching_affiliations(actor.user_id).await?;
                authorization::ensure_assigned(target, &assignments)
            }
        }
    }
}

fn not_found(notice_id: Uuid) -> AppError {
    AppError::NotFound(format!("Notice {} not found", notice_id))
}
