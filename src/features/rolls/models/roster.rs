use sqlx::FromRow;
use uuid::Uuid;

/// A student row as needed for numbering
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RosterStudent {
    pub id: Uuid,
    pub full_name: String,
    pub roll: Option<String>,
}

/// A roll number to write for one student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollAssignment {
    pub student_id: Uuid,
    pub roll: String,
}
