use sqlx::FromRow;
use uuid::Uuid;

/// Where a student sits in the academic structure.
///
/// Every field except `student_id` is optional: a student not yet assigned to
/// a batch has no course or semester either.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct StudentAffiliation {
    pub student_id: Uuid,
    pub batch_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    /// The batch's academic unit
    pub semester: Option<i32>,
}

impl StudentAffiliation {
    /// Affiliation for a student with no batch assignment
    pub fn unassigned(student_id: Uuid) -> Self {
        Self {
            student_id,
            ..Default::default()
        }
    }
}

/// One batch a teacher is assigned to, with the batch's course
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TeachingAffiliation {
    pub teacher_id: Uuid,
    pub batch_id: Uuid,
    pub course_id: Option<Uuid>,
}
