//! Authorship and audience rules for notice mutations.
//!
//! | Actor   | all / students / teachers / semester | course / batch           |
//! |---------|--------------------------------------|--------------------------|
//! | admin   | allowed                              | allowed                  |
//! | teacher | allowed                              | only assigned ones       |
//! | student | denied                               | denied                   |
//!
//! Update and delete are reserved to admins and the notice's creator.

use crate::core::error::{AppError, Result};
use crate::features::directory::models::{Actor, TeachingAffiliation, UserRole};
use crate::features::notices::models::{Notice, NoticeTarget};

/// Outcome of the role check for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPermission {
    Allowed,
    /// Allowed only if the actor's teaching assignments cover the target
    RequiresAssignment,
}

pub fn target_permission(actor: &Actor, target: &NoticeTarget) -> Result<TargetPermission> {
    match (actor.role, target) {
        (UserRole::Admin, _) => Ok(TargetPermission::Allowed),
        (UserRole::Teacher, NoticeTarget::Course(_) | NoticeTarget::Batch(_)) => {
            Ok(TargetPermission::RequiresAssignment)
        }
        // TODO: decide whether teachers need an assignment for semester-wide notices
        (
            UserRole::Teacher,
            NoticeTarget::All
            | NoticeTarget::Students
            | NoticeTarget::Teachers
            | NoticeTarget::Semester(_),
        ) => Ok(TargetPermission::Allowed),
        (UserRole::Student, _) => Err(AppError::Forbidden(
            "Students cannot publish notices".to_string(),
        )),
    }
}

/// Check a course/batch target against the teacher's assignments
pub fn ensure_assigned(target: &NoticeTarget, assignments: &[TeachingAffiliation]) -> Result<()> {
    match target {
        NoticeTarget::Batch(batch_id) => {
            if assignments.iter().any(|a| a.batch_id == *batch_id) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You can only create notices for your assigned batches".to_string(),
                ))
            }
        }
        NoticeTarget::Course(course_id) => {
            if assignments.iter().any(|a| a.course_id == Some(*course_id)) {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You can only create notices for your assigned courses".to_string(),
                ))
            }
        }
        _ => Ok(()),
    }
}

/// The author of a new notice must be the actor, unless an admin posts on someone's behalf
pub fn ensure_can_author_as(actor: &Actor, created_by: uuid::Uuid) -> Result<()> {
    if actor.owns_or_admin(created_by) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only create notices as yourself".to_string(),
        ))
    }
}

/// Update/delete gate
pub fn ensure_can_modify(actor: &Actor, notice: &Notice, action: &str) -> Result<()> {
    if actor.owns_or_admin(notice.created_by) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You don't have permission to {} this notice",
            action
        )))
    }
}

/// Whether the actor may see who has read a notice
pub fn can_view_receipts(actor: &Actor, notice: &Notice) -> bool {
    actor.owns_or_admin(notice.created_by)
}
