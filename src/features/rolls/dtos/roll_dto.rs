use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Outcome of a roll recalculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RollRecalculationDto {
    pub batch_id: Uuid,
    pub total_students: usize,
    /// Students whose roll changed
    pub updated: usize,
}
