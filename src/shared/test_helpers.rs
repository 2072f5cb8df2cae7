//! In-memory stand-ins for the PostgreSQL repositories and an auth shim for
//! router tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, Router};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::directory::models::{
    StudentAffiliation, TeachingAffiliation, UserRole, UserSummary,
};
use crate::features::directory::repositories::DirectoryRepository;
use crate::features::notices::models::{NewNotice, Notice, NoticeRead};
use crate::features::notices::services::visibility::VisibilityFilter;
use crate::features::notices::repositories::NoticeRepository;
use crate::features::rolls::models::{RollAssignment, RosterStudent};
use crate::features::rolls::repositories::{roll_update_failed, RosterRepository};

/// Layer that injects an `AuthenticatedUser` as the auth middleware would
pub fn with_user(router: Router, user_id: Uuid) -> Router {
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| async move {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::new(user_id));
            next.run(request).await
        },
    ))
}

#[derive(Debug, Clone)]
struct Batch {
    course_id: Uuid,
    semester: i32,
}

#[derive(Debug, Clone)]
struct Student {
    full_name: String,
    batch_id: Option<Uuid>,
    roll: Option<String>,
}

#[derive(Default)]
struct CampusState {
    users: HashMap<Uuid, UserSummary>,
    courses: HashMap<Uuid, String>,
    batches: HashMap<Uuid, Batch>,
    students: HashMap<Uuid, Student>,
    assignments: Vec<(Uuid, Uuid)>,
    notices: HashMap<Uuid, Notice>,
    reads: HashMap<(Uuid, Uuid), DateTime<Utc>>,
    fail_affiliations: bool,
    failing_roll_updates: HashSet<Uuid>,
}

/// Directory, notice and roster storage backed by one shared map set
#[derive(Default)]
pub struct InMemoryCampus {
    state: Mutex<CampusState>,
}

fn storage_error(what: &str) -> AppError {
    AppError::Database(sqlx::Error::Protocol(what.to_string()))
}

impl InMemoryCampus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, CampusState> {
        self.state.lock().unwrap()
    }

    pub fn add_user(&self, full_name: &str, role: UserRole) -> Uuid {
        let id = Uuid::new_v4();
        let email = format!("{}@campus.test", full_name.to_lowercase().replace(' ', "."));
        self.state().users.insert(
            id,
            UserSummary {
                id,
                full_name: full_name.to_string(),
                email: Some(email),
                role,
            },
        );
        id
    }

    pub fn add_course(&self, code: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state().courses.insert(id, code.to_string());
        id
    }

    pub fn add_batch(&self, course_id: Uuid, semester: i32) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state();
        assert!(state.courses.contains_key(&course_id), "unknown course");
        state.batches.insert(id, Batch { course_id, semester });
        id
    }

    /// A student user enrolled in `batch_id`, without a roll
    pub fn add_student(&self, full_name: &str, batch_id: Uuid) -> Uuid {
        let id = self.add_user(full_name, UserRole::Student);
        self.state().students.insert(
            id,
            Student {
                full_name: full_name.to_string(),
                batch_id: Some(batch_id),
                roll: None,
            },
        );
        id
    }

    pub fn assign_teacher(&self, teacher_id: Uuid, batch_id: Uuid) {
        self.state().assignments.push((teacher_id, batch_id));
    }

    pub fn set_roll(&self, student_id: Uuid, roll: &str) {
        if let Some(student) = self.state().students.get_mut(&student_id) {
            student.roll = Some(roll.to_string());
        }
    }

    pub fn roll_of(&self, student_id: Uuid) -> Option<String> {
        self.state()
            .students
            .get(&student_id)
            .and_then(|s| s.roll.clone())
    }

    pub fn fail_affiliation_lookups(&self) {
        self.state().fail_affiliations = true;
    }

    /// Make any roll write batch containing this student fail
    pub fn fail_roll_update_for(&self, student_id: Uuid) {
        self.state().failing_roll_updates.insert(student_id);
    }

    /// Store a notice directly, skipping every check
    pub fn seed_notice(&self, notice: NewNotice) -> Notice {
        self.seed_notice_at(notice, Utc::now())
    }

    pub fn seed_notice_at(&self, notice: NewNotice, created_at: DateTime<Utc>) -> Notice {
        let stored = Notice {
            id: Uuid::new_v4(),
            title: notice.title,
            message: notice.message,
            attachment_url: notice.attachment_url,
            target_type: notice.target.target_type(),
            target_value: notice.target.value(),
            is_pinned: notice.is_pinned,
            created_by: notice.created_by,
            created_at,
            updated_at: created_at,
            expires_at: notice.expires_at,
        };
        self.state().notices.insert(stored.id, stored.clone());
        stored
    }

    pub fn read_count(&self, notice_id: Uuid) -> usize {
        self.state()
            .reads
            .keys()
            .filter(|(n, _)| *n == notice_id)
            .count()
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryCampus {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserSummary>> {
        Ok(self.state().users.get(&user_id).cloned())
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        let state = self.state();
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn student_affiliation(&self, student_id: Uuid) -> Result<Option<StudentAffiliation>> {
        let state = self.state();
        if state.fail_affiliations {
            return Err(storage_error("affiliation lookup failed"));
        }

        Ok(state.students.get(&student_id).map(|student| {
            let batch = student.batch_id.and_then(|id| state.batches.get(&id));
            StudentAffiliation {
                student_id,
                batch_id: student.batch_id,
                course_id: batch.map(|b| b.course_id),
                semester: batch.map(|b| b.semester),
            }
        }))
    }

    async fn teaching_affiliations(&self, teacher_id: Uuid) -> Result<Vec<TeachingAffiliation>> {
        let state = self.state();
        Ok(state
            .assignments
            .iter()
            .filter(|(t, _)| *t == teacher_id)
            .filter_map(|(_, batch_id)| {
                state.batches.get(batch_id).map(|b| TeachingAffiliation {
                    teacher_id,
                    batch_id: *batch_id,
                    course_id: Some(b.course_id),
                })
            })
            .collect())
    }
}

#[async_trait]
impl NoticeRepository for InMemoryCampus {
    async fn insert(&self, notice: &NewNotice) -> Result<Notice> {
        if !self.state().users.contains_key(&notice.created_by) {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                notice.created_by
            )));
        }
        Ok(self.seed_notice(notice.clone()))
    }

    async fn find_by_id(&self, notice_id: Uuid) -> Result<Option<Notice>> {
        Ok(self.state().notices.get(&notice_id).cloned())
    }

    async fn list_visible(
        &self,
        filter: &VisibilityFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notice>> {
        Ok(self
            .state()
            .notices
            .values()
            .filter(|n| filter.matches(n, now))
            .cloned()
            .collect())
    }

    async fn count_unread(
        &self,
        filter: &VisibilityFilter,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let state = self.state();
        let count = state
            .notices
            .values()
            .filter(|n| filter.matches(n, now) && !state.reads.contains_key(&(n.id, user_id)))
            .count();
        Ok(count as i64)
    }

    async fn update(&self, notice: &Notice) -> Result<Option<Notice>> {
        let mut state = self.state();
        Ok(state.notices.get_mut(&notice.id).map(|stored| {
            *stored = notice.clone();
            stored.clone()
        }))
    }

    async fn delete_with_reads(&self, notice_id: Uuid) -> Result<bool> {
        let mut state = self.state();
        state.reads.retain(|(n, _), _| *n != notice_id);
        Ok(state.notices.remove(&notice_id).is_some())
    }

    async fn read_notice_ids(&self, user_id: Uuid, notice_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        let state = self.state();
        Ok(notice_ids
            .iter()
            .filter(|id| state.reads.contains_key(&(**id, user_id)))
            .copied()
            .collect())
    }

    async fn find_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<Option<NoticeRead>> {
        Ok(self
            .state()
            .reads
            .get(&(notice_id, user_id))
            .map(|read_at| NoticeRead {
                notice_id,
                user_id,
                read_at: *read_at,
            }))
    }

    async fn list_reads(&self, notice_id: Uuid) -> Result<Vec<NoticeRead>> {
        let mut reads: Vec<NoticeRead> = self
            .state()
            .reads
            .iter()
            .filter(|((n, _), _)| *n == notice_id)
            .map(|((n, u), read_at)| NoticeRead {
                notice_id: *n,
                user_id: *u,
                read_at: *read_at,
            })
            .collect();
        reads.sort_by(|a, b| b.read_at.cmp(&a.read_at));
        Ok(reads)
    }

    async fn upsert_read(
        &self,
        notice_id: Uuid,
        user_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<NoticeRead> {
        let mut state = self.state();
        if !state.notices.contains_key(&notice_id) {
            return Err(AppError::NotFound("Notice not found".to_string()));
        }
        state.reads.insert((notice_id, user_id), read_at);
        Ok(NoticeRead {
            notice_id,
            user_id,
            read_at,
        })
    }

    async fn delete_read(&self, notice_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self.state().reads.remove(&(notice_id, user_id)).is_some())
    }
}

#[async_trait]
impl RosterRepository for InMemoryCampus {
    async fn batch_exists(&self, batch_id: Uuid) -> Result<bool> {
        Ok(self.state().batches.contains_key(&batch_id))
    }

    async fn list_batch_students(&self, batch_id: Uuid) -> Result<Vec<RosterStudent>> {
        Ok(self
            .state()
            .students
            .iter()
            .filter(|(_, s)| s.batch_id == Some(batch_id))
            .map(|(id, s)| RosterStudent {
                id: *id,
                full_name: s.full_name.clone(),
                roll: s.roll.clone(),
            })
            .collect())
    }

    async fn apply_rolls(&self, assignments: &[RollAssignment]) -> Result<usize> {
        let mut state = self.state();
        if let Some(failed) = assignments
            .iter()
            .find(|a| state.failing_roll_updates.contains(&a.student_id))
        {
            return Err(roll_update_failed(failed.student_id, "connection reset"));
        }

        for assignment in assignments {
            if let Some(student) = state.students.get_mut(&assignment.student_id) {
                student.roll = Some(assignment.roll.clone());
            }
        }
        Ok(assignments.len())
    }
}
