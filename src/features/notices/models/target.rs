use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;

/// Audience category of a notice, matching the `notice_target_type` database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "notice_target_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    All,
    Students,
    Teachers,
    Semester,
    Course,
    Batch,
}

impl TargetType {
    pub const VARIANTS: [TargetType; 6] = [
        TargetType::All,
        TargetType::Students,
        TargetType::Teachers,
        TargetType::Semester,
        TargetType::Course,
        TargetType::Batch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::All => "all",
            TargetType::Students => "students",
            TargetType::Teachers => "teachers",
            TargetType::Semester => "semester",
            TargetType::Course => "course",
            TargetType::Batch => "batch",
        }
    }

    /// Whether notices of this type carry a `target_value`
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            TargetType::Semester | TargetType::Course | TargetType::Batch
        )
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::VARIANTS
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::VARIANTS.iter().map(|t| t.as_str()).collect();
                AppError::Validation(format!(
                    "Invalid target_type. Must be one of: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// A validated audience: the target type together with its parsed value.
///
/// Stored as (`target_type`, `target_value`) where the value is kept in
/// canonical text form (decimal semester, hyphenated lowercase uuid) so that
/// audience matching is plain equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeTarget {
    All,
    Students,
    Teachers,
    Semester(i32),
    Course(Uuid),
    Batch(Uuid),
}

impl NoticeTarget {
    /// Build a target from its stored or submitted parts.
    ///
    /// Values supplied for `all`/`students`/`teachers` are ignored.
    pub fn parse(target_type: TargetType, value: Option<&str>) -> Result<Self, AppError> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());

        if !target_type.requires_value() {
            return Ok(match target_type {
                TargetType::All => NoticeTarget::All,
                TargetType::Students => NoticeTarget::Students,
                _ => NoticeTarget::Teachers,
            });
        }

        let value = value.ok_or_else(|| {
            AppError::Validation(format!(
                "target_value is required when target_type is '{}'",
                target_type
            ))
        })?;

        match target_type {
            TargetType::Semester => value
                .parse::<i32>()
                .ok()
                .filter(|n| *n > 0)
                .map(NoticeTarget::Semester)
                .ok_or_else(|| {
                    AppError::Validation("Semester target_value must be a positive integer".into())
                }),
            TargetType::Course => Uuid::parse_str(value)
                .map(NoticeTarget::Course)
                .map_err(|_| AppError::Validation("Course target_value must be a UUID".into())),
            _ => Uuid::parse_str(value)
                .map(NoticeTarget::Batch)
                .map_err(|_| AppError::Validation("Batch target_value must be a UUID".into())),
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            NoticeTarget::All => TargetType::All,
            NoticeTarget::Students => TargetType::Students,
            NoticeTarget::Teachers => TargetType::Teachers,
            NoticeTarget::Semester(_) => TargetType::Semester,
            NoticeTarget::Course(_) => TargetType::Course,
            NoticeTarget::Batch(_) => TargetType::Batch,
        }
    }

    /// Canonical `target_value` column content
    pub fn value(&self) -> Option<String> {
        match self {
            NoticeTarget::All | NoticeTarget::Students | NoticeTarget::Teachers => None,
            NoticeTarget::Semester(n) => Some(n.to_string()),
            NoticeTarget::Course(id) | NoticeTarget::Batch(id) => Some(id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_from_str() {
        for t in TargetType::VARIANTS {
            assert_eq!(t.as_str().parse::<TargetType>().unwrap(), t);
        }
        assert!(matches!(
            "everyone".parse::<TargetType>(),
            Err(AppError::Validation(_))
        ));
        assert!("Batch".parse::<TargetType>().is_err());
    }

    #[test]
    fn test_broad_targets_drop_value() {
        let target = NoticeTarget::parse(TargetType::Students, Some("5")).unwrap();
        assert_eq!(target, NoticeTarget::Students);
        assert_eq!(target.value(), None);
    }

    #[test]
    fn test_scoped_targets_require_value() {
        for t in [TargetType::Semester, TargetType::Course, TargetType::Batch] {
            assert!(matches!(
                NoticeTarget::parse(t, None),
                Err(AppError::Validation(_))
            ));
            assert!(NoticeTarget::parse(t, Some("  ")).is_err());
        }
    }

    #[test]
    fn test_semester_must_be_positive_integer() {
        assert_eq!(
            NoticeTarget::parse(TargetType::Semester, Some(" 5 ")).unwrap(),
            NoticeTarget::Semester(5)
        );
        assert!(NoticeTarget::parse(TargetType::Semester, Some("0")).is_err());
        assert!(NoticeTarget::parse(TargetType::Semester, Some("fifth")).is_err());
    }

    #[test]
    fn test_uuid_values_are_canonicalised() {
        let id = Uuid::new_v4();
        let upper = id.to_string().to_uppercase();

        let target = NoticeTarget::parse(TargetType::Batch, Some(&upper)).unwrap();

        assert_eq!(target, NoticeTarget::Batch(id));
        assert_eq!(target.value(), Some(id.to_string()));
        assert!(NoticeTarget::parse(TargetType::Course, Some("cs-101")).is_err());
    }
}
