use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::directory::models::Actor;
use crate::features::directory::DirectoryService;
use crate::features::rolls::dtos::RollRecalculationDto;
use crate::features::rolls::models::{RollAssignment, RosterStudent};
use crate::features::rolls::repositories::RosterRepository;

/// Number students 1..n by full name (byte order as stored, id breaks ties)
/// and return only the assignments that differ from the current roll.
pub fn plan_rolls(mut students: Vec<RosterStudent>) -> Vec<RollAssignment> {
    students.sort_by(|a, b| a.full_name.cmp(&b.full_name).then_with(|| a.id.cmp(&b.id)));

    students
        .into_iter()
        .enumerate()
        .filter_map(|(index, student)| {
            let roll = (index + 1).to_string();
            (student.roll.as_deref() != Some(roll.as_str())).then(|| RollAssignment {
                student_id: student.id,
                roll,
            })
        })
        .collect()
}

pub struct RollService {
    repository: Arc<dyn RosterRepository>,
    directory: Arc<DirectoryService>,
}

impl RollService {
    pub fn new(repository: Arc<dyn RosterRepository>, directory: Arc<DirectoryService>) -> Self {
        Self {
            repository,
            directory,
        }
    }

    pub async fn actor(&self, user: &AuthenticatedUser) -> Result<Actor> {
        self.directory.resolve_actor(user).await
    }

    pub async fn recalculate_batch_rolls(
        &self,
        actor: &Actor,
        batch_id: Uuid,
    ) -> Result<RollRecalculationDto> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can recalculate roll numbers".to_string(),
            ));
        }

        if !self.repository.batch_exists(batch_id).await? {
            return Err(AppError::NotFound(format!("Batch {} not found", batch_id)));
        }

        let students = self.repository.list_batch_students(batch_id).await?;
        let total_students = students.len();
        let plan = plan_rolls(students);

        let updated = self.repository.apply_rolls(&plan).await?;

        tracing::info!(
            "Recalculated rolls for batch {}: {} students, {} updated",
            batch_id,
            total_students,
            updated
        );

        Ok(RollRecalculationDto {
            batch_id,
            total_students,
            updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::name::en::Name;
    use fake::Fake;

    use crate::features::directory::models::UserRole;
    use crate::shared::test_helpers::InMemoryCampus;

    fn student(name: &str, roll: Option<&str>) -> RosterStudent {
        RosterStudent {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            roll: roll.map(str::to_string),
        }
    }

    fn rolls_by_name(students: &[RosterStudent], plan: &[RollAssignment]) -> Vec<(String, String)> {
        let mut named: Vec<(String, String)> = plan
            .iter()
            .map(|a| {
                let name = students
                    .iter()
                    .find(|s| s.id == a.student_id)
                    .map(|s| s.full_name.clone())
                    .unwrap();
                (name, a.roll.clone())
            })
            .collect();
        named.sort();
        named
    }

    #[test]
    fn test_rolls_follow_name_order() {
        let students = vec![
            student("Bob", None),
            student("Alice", None),
            student("Carol", None),
        ];

        let plan = plan_rolls(students.clone());

        assert_eq!(
            rolls_by_name(&students, &plan),
            vec![
                ("Alice".to_string(), "1".to_string()),
                ("Bob".to_string(), "2".to_string()),
                ("Carol".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_unchanged_rolls_are_skipped() {
        let students = vec![
            student("Alice", Some("1")),
            student("Bob", Some("3")),
            student("Carol", Some("3")),
        ];

        let plan = plan_rolls(students.clone());

        assert_eq!(
            rolls_by_name(&students, &plan),
            vec![("Bob".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_case_sensitive_byte_order() {
        let students = vec![student("alice", None), student("Zed", None)];

        let plan = plan_rolls(students.clone());

        assert_eq!(
            rolls_by_name(&students, &plan),
            vec![
                ("Zed".to_string(), "1".to_string()),
                ("alice".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_random_roster_gets_contiguous_rolls() {
        let students: Vec<RosterStudent> = (0..40)
            .map(|_| {
                let name: String = Name().fake();
                student(&name, None)
            })
            .collect();

        let plan = plan_rolls(students.clone());
        assert_eq!(plan.len(), students.len());

        let mut by_roll: Vec<(usize, String)> = plan
            .iter()
            .map(|a| {
                let name = students
                    .iter()
                    .find(|s| s.id == a.student_id)
                    .map(|s| s.full_name.clone())
                    .unwrap();
                (a.roll.parse::<usize>().unwrap(), name)
            })
            .collect();
        by_roll.sort();

        let rolls: Vec<usize> = by_roll.iter().map(|(r, _)| *r).collect();
        assert_eq!(rolls, (1..=students.len()).collect::<Vec<_>>());
        assert!(by_roll.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_empty_batch() {
        assert!(plan_rolls(Vec::new()).is_empty());
    }

    fn service(campus: &Arc<InMemoryCampus>) -> RollService {
        let directory = Arc::new(DirectoryService::new(campus.clone()));
        RollService::new(campus.clone(), directory)
    }

    #[tokio::test]
    async fn test_recalculate_writes_changed_rolls() {
        let campus = InMemoryCampus::new();
        let admin = campus.add_user("Admin", UserRole::Admin);
        let course = campus.add_course("CSE");
        let batch = campus.add_batch(course, 1);
        let bob = campus.add_student("Bob", batch);
        let alice = campus.add_student("Alice", batch);
        let carol = campus.add_student("Carol", batch);
        campus.set_roll(alice, "1");

        let summary = service(&campus)
            .recalculate_batch_rolls(&Actor::new(admin, UserRole::Admin), batch)
            .await
            .unwrap();

        assert_eq!(
            summary,
            RollRecalculationDto {
                batch_id: batch,
                total_students: 3,
                updated: 2,
            }
        );
        assert_eq!(campus.roll_of(alice).as_deref(), Some("1"));
        assert_eq!(campus.roll_of(bob).as_deref(), Some("2"));
        assert_eq!(campus.roll_of(carol).as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_rolls_untouched() {
        let campus = InMemoryCampus::new();
        let admin = campus.add_user("Admin", UserRole::Admin);
        let course = campus.add_course("CSE");
        let batch = campus.add_batch(course, 1);
        let alice = campus.add_student("Alice", batch);
        let bob = campus.add_student("Bob", batch);
        campus.fail_roll_update_for(bob);

        let result = service(&campus)
            .recalculate_batch_rolls(&Actor::new(admin, UserRole::Admin), batch)
            .await;

        match result {
            Err(AppError::Internal(msg)) => assert!(msg.contains(&bob.to_string())),
            other => panic!("expected roll update failure, got {:?}", other),
        }
        assert_eq!(campus.roll_of(alice), None);
        assert_eq!(campus.roll_of(bob), None);
    }

    #[tokio::test]
    async fn test_only_admins_recalculate() {
        let campus = InMemoryCampus::new();
        let teacher = campus.add_user("Teacher", UserRole::Teacher);
        let course = campus.add_course("CSE");
        let batch = campus.add_batch(course, 1);

        let result = service(&campus)
            .recalculate_batch_rolls(&Actor::new(teacher, UserRole::Teacher), batch)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_unknown_batch() {
        let campus = InMemoryCampus::new();
        let admin = campus.add_user("Admin", UserRole::Admin);

        let result = service(&campus)
            .recalculate_batch_rolls(&Actor::new(admin, UserRole::Admin), Uuid::new_v4())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
