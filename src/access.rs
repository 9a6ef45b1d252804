//! Project visibility rules.

use uuid::Uuid;

use crate::models::Project;

/// Whether `user_id` may view `project`.
///
/// True iff the project exists and the user is its owner or in its
/// participant set. A missing project is `false`, not an error, so callers
/// can answer "no such project" and "not yours" identically. Ownership is
/// sufficient on its own: an owner who has dropped out of the participant
/// set keeps access.
pub fn can_view(user_id: Uuid, project: Option<&Project>, participant_ids: &[Uuid]) -> bool {
    let Some(project) = project else {
        return false;
    };

    project.owner_id == user_id || participant_ids.contains(&user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project(owner_id: Uuid) -> Project {
        Project {
            id: "LR1xJMcGTvCag-rSFx45cA".to_string(),
            name: "eval harness".to_string(),
            description: None,
            owner_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_project_is_not_viewable() {
        assert!(!can_view(Uuid::new_v4(), None, &[]));
    }

    #[test]
    fn owner_can_view() {
        let owner = Uuid::new_v4();
        let p = project(owner);
        assert!(can_view(owner, Some(&p), &[owner]));
    }

    #[test]
    fn owner_outside_participant_set_still_views() {
        let owner = Uuid::new_v4();
        let p = project(owner);
        assert!(can_view(owner, Some(&p), &[]));
    }

    #[test]
    fn participant_can_view() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let p = project(owner);
        assert!(can_view(member, Some(&p), &[owner, member]));
    }

    #[test]
    fn outsider_cannot_view() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let p = project(owner);
        assert!(!can_view(stranger, Some(&p), &[owner, member]));
    }
}
