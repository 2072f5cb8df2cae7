use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::notices::models::{NoticeTarget, TargetType};

/// Database model for notice
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Notice {
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
}

impl Notice {
    /// A notice expiring exactly at `now` is still live
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    pub fn target(&self) -> Result<NoticeTarget> {
        NoticeTarget::parse(self.target_type, self.target_value.as_deref())
    }

    /// Apply a validated patch; fields not present in `changes` are kept
    pub fn apply(&mut self, changes: NoticeChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(message) = changes.message {
            self.message = message;
        }
        if let Some(attachment_url) = changes.attachment_url {
            self.attachment_url = attachment_url;
        }
        if let Some(target) = changes.target {
            self.target_type = target.target_type();
            self.target_value = target.value();
        }
        if let Some(is_pinned) = changes.is_pinned {
            self.is_pinned = is_pinned;
        }
        if let Some(expires_at) = changes.expires_at {
            self.expires_at = expires_at;
        }
    }
}

/// Validated data for inserting a notice
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotice {
    pub title: String,
    pub message: String,
    pub attachment_url: Option<String>,
    pub target: NoticeTarget,
    pub is_pinned: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

/// Validated partial update. The outer `Option` means "provided", the inner
/// one (for nullable columns) allows clearing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeChanges {
    pub title: Option<String>,
    pub message: Option<String>,
    pub attachment_url: Option<Option<String>>,
    pub target: Option<NoticeTarget>,
    pub is_pinned: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn notice() -> Notice {
        let now = Utc::now();
        Notice {
            id: Uuid::new_v4(),
            title: "Library hours".to_string(),
            message: "Open until 9pm".to_string(),
            attachment_url: Some("https://files.example.edu/hours.pdf".to_string()),
            target_type: TargetType::Semester,
            target_value: Some("3".to_string()),
            is_pinned: false,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            expires_at: None,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let mut n = notice();
        assert!(!n.is_expired_at(now));

        n.expires_at = Some(now);
        assert!(!n.is_expired_at(now));

        n.expires_at = Some(now - Duration::seconds(1));
        assert!(n.is_expired_at(now));
    }

    #[test]
    fn test_apply_only_touches_provided_fields() {
        let mut n = notice();
        let original = n.clone();

        n.apply(NoticeChanges {
            is_pinned: Some(true),
            attachment_url: Some(None),
            ..Default::default()
        });

        assert!(n.is_pinned);
        assert_eq!(n.attachment_url, None);
        assert_eq!(n.title, original.title);
        assert_eq!(n.message, original.message);
        assert_eq!(n.target_type, TargetType::Semester);
        assert_eq!(n.target_value.as_deref(), Some("3"));
    }

    #[test]
    fn test_apply_target_rewrites_type_and_value() {
        let mut n = notice();

        n.apply(NoticeChanges {
            target: Some(NoticeTarget::Teachers),
            ..Default::default()
        });

        assert_eq!(n.target_type, TargetType::Teachers);
        assert_eq!(n.target_value, None);
        assert_eq!(n.target().unwrap(), NoticeTarget::Teachers);
    }
}
