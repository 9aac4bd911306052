//! Run-level reviewer assignment, independent of per-item state.

use crate::types::{Reviewer, User, UserStatus};

#[derive(Debug, Clone, Default)]
pub struct ReviewerAssignments {
    reviewers: Vec<Reviewer>,
}

impl ReviewerAssignments {
    pub fn new(reviewers: Vec<Reviewer>) -> Self {
        Self { reviewers }
    }

    pub fn list(&self) -> &[Reviewer] {
        &self.reviewers
    }

    pub fn is_assigned(&self, user_id: &str) -> bool {
        self.reviewers.iter().any(|r| r.id == user_id)
    }

    /// Adds every user not already assigned and returns the new reviewers.
    pub fn assign<'a>(&mut self, users: impl IntoIterator<Item = &'a User>, now: i64) -> Vec<Reviewer> {
        let mut added = Vec::new();
        for user in users {
            if self.is_assigned(&user.id) || added.iter().any(|r: &Reviewer| r.id == user.id) {
                continue;
            }
            added.push(Reviewer {
                id: user.id.clone(),
                name: user.display_name(),
                assigned_at: now,
            });
        }
        self.reviewers.extend(added.iter().cloned());
        added
    }

    pub fn remove(&mut self, user_id: &str) -> Option<Reviewer> {
        let pos = self.reviewers.iter().position(|r| r.id == user_id)?;
        Some(self.reviewers.remove(pos))
    }

    /// Active users not yet assigned whose name or email contains `query`.
    pub fn available<'a>(&self, directory: &'a [User], query: &str) -> Vec<&'a User> {
        let query = query.to_lowercase();
        directory
            .iter()
            .filter(|u| u.status == UserStatus::Active)
            .filter(|u| !self.is_assigned(&u.id))
            .filter(|u| {
                u.display_name().to_lowercase().contains(&query)
                    || u.email.to_lowercase().contains(&query)
            })
            .collect()
    }
}

/// `"Assigned reviewer: A"` or `"Assigned reviewers: A, B"`.
pub fn assigned_message(added: &[Reviewer]) -> String {
    let names: Vec<&str> = added.iter().map(|r| r.name.as_str()).collect();
    let plural = if added.len() > 1 { "s" } else { "" };
    format!("Assigned reviewer{plural}: {}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn assign_skips_existing_reviewers() {
        let users = seed::demo_users();
        let mut assignments = ReviewerAssignments::default();
        let added = assignments.assign([&users[0], &users[1]], 10);
        assert_eq!(added.len(), 2);
        assert_eq!(assigned_message(&added), "Assigned reviewers: John Martinez, Sarah Chen");

        let added = assignments.assign([&users[1], &users[2]], 20);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].name, "Mike Johnson");
        assert_eq!(assigned_message(&added), "Assigned reviewer: Mike Johnson");
        assert_eq!(assignments.list().len(), 3);
    }

    #[test]
    fn available_excludes_assigned_and_inactive() {
        let users = seed::demo_users();
        let mut assignments = ReviewerAssignments::default();
        assignments.assign([&users[0]], 0);
        let ids: Vec<&str> = assignments
            .available(&users, "")
            .iter()
            .map(|u| u.id.as_str())
            .collect();
        assert_eq!(ids, ["user-2", "user-3", "user-5"]);
        let by_email = assignments.available(&users, "wilson@");
        assert_eq!(by_email.len(), 1);
    }

    #[test]
    fn remove_returns_reviewer() {
        let users = seed::demo_users();
        let mut assignments = ReviewerAssignments::default();
        assignments.assign([&users[2]], 0);
        assert_eq!(assignments.remove("user-3").map(|r| r.name).as_deref(), Some("Mike Johnson"));
        assert!(assignments.remove("user-3").is_none());
    }
}
