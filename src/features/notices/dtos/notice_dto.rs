use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::directory::models::{UserRole, UserSummary};
use crate::features::notices::models::{
    NewNotice, Notice, NoticeChanges, NoticeRead, NoticeTarget, TargetType,
};
use crate::shared::nullable;

/// `target_value` as sent by clients: semesters often arrive as JSON numbers
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TargetValueInput {
    Text(String),
    Number(i64),
}

impl TargetValueInput {
    fn into_text(self) -> String {
        match self {
            TargetValueInput::Text(s) => s,
            TargetValueInput::Number(n) => n.to_string(),
        }
    }
}

/// Query params for listing notices
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListNoticesQuery {
    /// Student whose affiliation is used for audience matching (defaults to the caller)
    pub student_id: Option<Uuid>,
}

/// Request DTO for creating a notice.
///
/// Required fields are optional here so that missing ones are reported as
/// validation errors rather than JSON decoding failures.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateNoticeDto {
    #[validate(length(max = 255, message = "Title must not exceed 255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Message must not exceed 10000 characters"))]
    pub message: Option<String>,

    #[validate(length(max = 2048, message = "Attachment URL must not exceed 2048 characters"))]
    pub attachment_url: Option<String>,

    /// One of: all, students, teachers, semester, course, batch
    pub target_type: Option<String>,

    /// Semester number, course id or batch id depending on `target_type`
    #[schema(value_type = Option<String>)]
    pub target_value: Option<TargetValueInput>,

    pub is_pinned: Option<bool>,

    pub expires_at: Option<DateTime<Utc>>,

    /// Author of the notice; defaults to the caller
    pub created_by: Option<Uuid>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateNoticeDto {
    /// Check required fields and the target invariant
    pub fn into_new_notice(self, now: DateTime<Utc>) -> Result<NewNotice> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let title = non_blank(self.title);
        let message = non_blank(self.message);
        let target_type = non_blank(self.target_type);

        let missing: Vec<&str> = [
            ("title", title.is_none()),
            ("message", message.is_none()),
            ("target_type", target_type.is_none()),
            ("created_by", self.created_by.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (Some(title), Some(message), Some(target_type), Some(created_by)) =
            (title, message, target_type, self.created_by)
        else {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let target_type: TargetType = target_type.parse()?;
        let target_value = self.target_value.map(TargetValueInput::into_text);
        let target = NoticeTarget::parse(target_type, target_value.as_deref())?;

        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(AppError::Validation(
                    "expires_at must be in the future".to_string(),
                ));
            }
        }

        Ok(NewNotice {
            title,
            message,
            attachment_url: non_blank(self.attachment_url),
            target,
            is_pinned: self.is_pinned.unwrap_or(false),
            expires_at: self.expires_at,
            created_by,
        })
    }
}

/// Request DTO for updating a notice. Omitted fields are left unchanged;
/// `attachment_url`, `target_value` and `expires_at` can be cleared with `null`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateNoticeDto {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 10000, message = "Message must be 1-10000 characters"))]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "nullable::deserialize")]
    #[schema(value_type = Option<String>)]
    pub attachment_url: Option<Option<String>>,

    pub target_type: Option<String>,

    #[serde(default, deserialize_with = "nullable::deserialize")]
    #[schema(value_type = Option<String>)]
    pub target_value: Option<Option<TargetValueInput>>,

    pub is_pinned: Option<bool>,

    #[serde(default, deserialize_with = "nullable::deserialize")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateNoticeDto {
    /// Validate the patch against the stored notice.
    ///
    /// Target type and value are merged with the current ones before the
    /// target invariant is checked, so sending only `target_value` re-scopes
    /// a notice within its current type.
    pub fn into_changes(self, current: &Notice) -> Result<NoticeChanges> {
        self.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let title = match self.title {
            Some(t) => Some(non_blank(Some(t)).ok_or_else(|| {
                AppError::Validation("title must not be blank".to_string())
            })?),
            None => None,
        };
        let message = match self.message {
            Some(m) => Some(non_blank(Some(m)).ok_or_else(|| {
                AppError::Validation("message must not be blank".to_string())
            })?),
            None => None,
        };

        let target = if self.target_type.is_some() || self.target_value.is_some() {
            let target_type = match self.target_type {
                Some(t) => t.trim().parse::<TargetType>()?,
                None => current.target_type,
            };
            let target_value = match self.target_value {
                Some(v) => v.map(TargetValueInput::into_text),
                None => current.target_value.clone(),
            };
            Some(NoticeTarget::parse(target_type, target_value.as_deref())?)
        } else {
            None
        };

        Ok(NoticeChanges {
            title,
            message,
            attachment_url: self.attachment_url.map(non_blank),
            target,
            is_pinned: self.is_pinned,
            expires_at: self.expires_at,
        })
    }
}

/// Response DTO for notice
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoticeResponseDto {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub attachment_url: Option<String>,
    pub target_type: TargetType,
    pub target_value: Option<String>,
    pub is_pinned: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the caller has read this notice
    pub is_read: bool,
    /// Author profile; absent when the author has no directory row
    pub created_by_user: Option<UserSummary>,
}

impl NoticeResponseDto {
    pub fn from_notice(n: Notice, is_read: bool, author: Option<UserSummary>) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            attachment_url: n.attachment_url,
            target_type: n.target_type,
            target_value: n.target_value,
            is_pinned: n.is_pinned,
            created_by: n.created_by,
            created_at: n.created_at,
            updated_at: n.updated_at,
            expires_at: n.expires_at,
            is_read,
            created_by_user: author,
        }
    }
}

/// Who read a notice and when
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadReceiptDto {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub read_at: DateTime<Utc>,
}

impl ReadReceiptDto {
    pub fn new(read: NoticeRead, user: Option<&UserSummary>) -> Self {
        Self {
            user_id: read.user_id,
            full_name: user.map(|u| u.full_name.clone()),
            email: user.and_then(|u| u.email.clone()),
            role: user.map(|u| u.role),
            read_at: read.read_at,
        }
    }
}

/// Single notice with the caller's read state and, for its owner or an admin, the receipts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoticeDetailDto {
    #[serde(flatten)]
    pub notice: NoticeResponseDto,
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reads: Option<Vec<ReadReceiptDto>>,
}

/// Read marker returned by mark-as-read
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadStatusDto {
    pub notice_id: Uuid,
    pub user_id: Uuid,
    pub read_at: DateTime<Utc>,
}

impl From<NoticeRead> for ReadStatusDto {
    fn from(r: NoticeRead) -> Self {
        Self {
            notice_id: r.notice_id,
            user_id: r.user_id,
            read_at: r.read_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountDto {
    pub unread: i64,
}
