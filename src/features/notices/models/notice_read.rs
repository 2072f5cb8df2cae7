use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Read marker, unique per (notice_id, user_id)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NoticeRead {
    pub notice_id: Uuid,
    pub user_id: Uuid,
    pub read_at: DateTime<Utc>,
}
