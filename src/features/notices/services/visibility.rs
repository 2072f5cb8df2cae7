//! Who may see which notice.
//!
//! The audience rule is a disjunction of [`Predicate`]s built once per
//! viewer. It can be evaluated against a loaded [`Notice`] or compiled into a
//! parameterised SQL condition; both paths share the same predicate list so
//! the rule has a single definition.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::features::directory::models::StudentAffiliation;
use crate::features::notices::models::{Notice, NoticeTarget, TargetType};

/// The audience a listing is computed for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Admin,
    Teacher { teacher_id: Uuid },
    Student(StudentAffiliation),
}

/// One way a notice can reach a viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every notice
    Any,
    /// Any notice of this audience category
    TargetType(TargetType),
    /// A notice scoped to exactly this semester, course or batch
    TargetEquals(NoticeTarget),
    /// Notices authored by this user
    CreatedBy(Uuid),
}

impl Predicate {
    pub fn matches(&self, notice: &Notice) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::TargetType(t) => notice.target_type == *t,
            Predicate::TargetEquals(target) => {
                notice.target_type == target.target_type()
                    && notice.target_value == target.value()
            }
            Predicate::CreatedBy(user_id) => notice.created_by == *user_id,
        }
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Predicate::Any => {
                qb.push("TRUE");
            }
            Predicate::TargetType(t) => {
                qb.push("target_type = ").push_bind(*t);
            }
            Predicate::TargetEquals(target) => match target.value() {
                Some(value) => {
                    qb.push("(target_type = ")
                        .push_bind(target.target_type())
                        .push(" AND target_value = ")
                        .push_bind(value)
                        .push(")");
                }
                None => {
                    qb.push("target_type = ").push_bind(target.target_type());
                }
            },
            Predicate::CreatedBy(user_id) => {
                qb.push("created_by = ").push_bind(*user_id);
            }
        }
    }
}

/// A notice is visible when it is not expired and any predicate matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    any_of: Vec<Predicate>,
}

impl VisibilityFilter {
    pub fn for_viewer(viewer: &Viewer) -> Self {
        let any_of = match viewer {
            Viewer::Admin => vec![Predicate::Any],
            Viewer::Teacher { teacher_id } => vec![
                Predicate::TargetType(TargetType::All),
                Predicate::TargetType(TargetType::Teachers),
                Predicate::CreatedBy(*teacher_id),
            ],
            Viewer::Student(affiliation) => {
                let mut predicates = vec![
                    Predicate::TargetType(TargetType::All),
                    Predicate::TargetType(TargetType::Students),
                ];
                if let Some(semester) = affiliation.semester {
                    predicates.push(Predicate::TargetEquals(NoticeTarget::Semester(semester)));
                }
                if let Some(batch_id) = affiliation.batch_id {
                    predicates.push(Predicate::TargetEquals(NoticeTarget::Batch(batch_id)));
                }
                if let Some(course_id) = affiliation.course_id {
                    predicates.push(Predicate::TargetEquals(NoticeTarget::Course(course_id)));
                }
                predicates
            }
        };

        Self { any_of }
    }

    #[cfg(test)]
    pub fn predicates(&self) -> &[Predicate] {
        &self.any_of
    }

    pub fn matches(&self, notice: &Notice, now: DateTime<Utc>) -> bool {
        !notice.is_expired_at(now) && self.any_of.iter().any(|p| p.matches(notice))
    }

    /// Append ` WHERE ...` for this filter to a query over `notices`
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push(" WHERE (expires_at IS NULL OR expires_at >= ")
            .push_bind(now)
            .push(")");

        if self.any_of.is_empty() {
            qb.push(" AND FALSE");
            return;
        }

        qb.push(" AND (");
        for (i, predicate) in self.any_of.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            predicate.push_sql(qb);
        }
        qb.push(")");
    }
}

/// Listing order: pinned first, newest first within each group, id as tiebreaker
pub fn sort_for_listing(notices: &mut [Notice]) {
    notices.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
