//! Persistence ports.
//!
//! The workspace never touches storage directly. The app loads a run through
//! these traits, and after every mutating workspace call hands the resulting
//! [`Mutation`] to [`persist`]. [`InMemoryRepository`] is the test double;
//! [`crate::db::SqliteRepository`] is the durable implementation.

#![allow(async_fn_in_trait)]

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, ReviewError};
use crate::seed;
use crate::session::Session;
use crate::types::{
    ConformanceResult, ConformanceRun, ItemComment, MaterialIndexVersion, Project, Reviewer, User,
};
use crate::workspace::{Mutation, SavedState};

pub trait ResultRepository {
    /// The run record and its results in report order.
    async fn load_run(&self, run_id: &str) -> Result<(ConformanceRun, Vec<ConformanceResult>)>;
    /// Replaces the stored snapshot of one result.
    async fn save_result(&self, run_id: &str, result: &ConformanceResult) -> Result<()>;
    /// Every comment of the run as `(item_id, comment)` in insertion order.
    async fn load_comments(&self, run_id: &str) -> Result<Vec<(String, ItemComment)>>;
    async fn append_comment(&self, run_id: &str, item_id: &str, comment: &ItemComment) -> Result<()>;
    async fn load_reviewers(&self, run_id: &str) -> Result<Vec<Reviewer>>;
    /// Replaces the run's reviewer list.
    async fn save_reviewers(&self, run_id: &str, reviewers: &[Reviewer]) -> Result<()>;
}

pub trait UserRepository {
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn find_user(&self, id: &str) -> Result<User>;
}

pub trait ProjectRepository {
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn find_run(&self, id: &str) -> Result<ConformanceRun>;
    async fn runs_for_project(&self, project_id: &str) -> Result<Vec<ConformanceRun>>;
    async fn material_index_versions(&self) -> Result<Vec<MaterialIndexVersion>>;
}

/// Writes every record in `mutation` through `repo`.
pub async fn persist<R: ResultRepository>(repo: &R, run_id: &str, mutation: &Mutation) -> Result<()> {
    for result in &mutation.results {
        repo.save_result(run_id, result).await?;
    }
    for (item_id, comment) in &mutation.comments {
        repo.append_comment(run_id, item_id, comment).await?;
    }
    if let Some(reviewers) = &mutation.reviewers {
        repo.save_reviewers(run_id, reviewers).await?;
    }
    Ok(())
}

/// Loads the comments and reviewers a workspace needs to resume a run.
pub async fn load_saved<R: ResultRepository>(repo: &R, run_id: &str) -> Result<SavedState> {
    Ok(SavedState {
        comments: repo.load_comments(run_id).await?,
        reviewers: repo.load_reviewers(run_id).await?,
    })
}

/// Full user directory, admin only.
pub async fn admin_users<R: UserRepository>(repo: &R, session: &Session) -> Result<Vec<User>> {
    session.require_admin("User management")?;
    repo.list_users().await
}

/// Material Index versions, admin only.
pub async fn admin_material_indexes<R: ProjectRepository>(
    repo: &R,
    session: &Session,
) -> Result<Vec<MaterialIndexVersion>> {
    session.require_admin("Material Index management")?;
    repo.material_index_versions().await
}

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    projects: Vec<Project>,
    runs: Vec<ConformanceRun>,
    results: HashMap<String, Vec<ConformanceResult>>,
    comments: HashMap<String, Vec<(String, ItemComment)>>,
    reviewers: HashMap<String, Vec<Reviewer>>,
    material_indexes: Vec<MaterialIndexVersion>,
}

/// Process-local repository. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<MemoryState>,
}

impl InMemoryRepository {
    /// Repository preloaded with the demonstration dataset.
    pub fn seeded() -> Self {
        let mut results = HashMap::new();
        results.insert(seed::DEMO_RUN_ID.to_owned(), seed::demo_results());
        Self {
            state: Mutex::new(MemoryState {
                users: seed::demo_users(),
                projects: seed::demo_projects(),
                runs: seed::demo_runs(),
                results,
                material_indexes: seed::demo_material_indexes(),
                ..MemoryState::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultRepository for InMemoryRepository {
    async fn load_run(&self, run_id: &str) -> Result<(ConformanceRun, Vec<ConformanceResult>)> {
        let state = self.state();
        let run = state
            .runs
            .iter()
            .find(|r| r.id == run_id)
            .cloned()
            .ok_or_else(|| ReviewError::not_found("run", run_id))?;
        let results = state.results.get(run_id).cloned().unwrap_or_default();
        Ok((run, results))
    }

    async fn save_result(&self, run_id: &str, result: &ConformanceResult) -> Result<()> {
        let mut state = self.state();
        let slot = state
            .results
            .get_mut(run_id)
            .and_then(|results| results.iter_mut().find(|r| r.id == result.id))
            .ok_or_else(|| ReviewError::not_found("result", result.id.as_str()))?;
        *slot = result.clone();
        Ok(())
    }

    async fn load_comments(&self, run_id: &str) -> Result<Vec<(String, ItemComment)>> {
        Ok(self.state().comments.get(run_id).cloned().unwrap_or_default())
    }

    async fn append_comment(&self, run_id: &str, item_id: &str, comment: &ItemComment) -> Result<()> {
        self.state()
            .comments
            .entry(run_id.to_owned())
            .or_default()
            .push((item_id.to_owned(), comment.clone()));
        Ok(())
    }

    async fn load_reviewers(&self, run_id: &str) -> Result<Vec<Reviewer>> {
        Ok(self.state().reviewers.get(run_id).cloned().unwrap_or_default())
    }

    async fn save_reviewers(&self, run_id: &str, reviewers: &[Reviewer]) -> Result<()> {
        self.state().reviewers.insert(run_id.to_owned(), reviewers.to_vec());
        Ok(())
    }
}

impl UserRepository for InMemoryRepository {
    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.state().users.clone())
    }

    async fn find_user(&self, id: &str) -> Result<User> {
        self.state()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ReviewError::not_found("user", id))
    }
}

impl ProjectRepository for InMemoryRepository {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.state().projects.clone())
    }

    async fn find_run(&self, id: &str) -> Result<ConformanceRun> {
        self.state()
            .runs
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ReviewError::not_found("run", id))
    }

    async fn runs_for_project(&self, project_id: &str) -> Result<Vec<ConformanceRun>> {
        let state = self.state();
        if !state.projects.iter().any(|p| p.id == project_id) {
            return Err(ReviewError::not_found("project", project_id));
        }
        Ok(state.runs.iter().filter(|r| r.project_id == project_id).cloned().collect())
    }

    async fn material_index_versions(&self) -> Result<Vec<MaterialIndexVersion>> {
        Ok(self.state().material_indexes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;
    use crate::types::OverallStatus;
    use crate::workspace::ReviewWorkspace;

    #[tokio::test]
    async fn mutations_round_trip_through_the_repository() {
        let repo = InMemoryRepository::seeded();
        let user = repo.find_user("user-2").await.unwrap();
        let (run, results) = repo.load_run("run-1").await.unwrap();
        let directory = repo.list_users().await.unwrap();
        let mut ws = ReviewWorkspace::new(run, results, directory, Session::new(user), Box::new(NullNotifier));

        let mutation = ws
            .change_status("result-6", OverallStatus::PreApproved, OverallStatus::ReviewRequired)
            .unwrap();
        persist(&repo, "run-1", &mutation).await.unwrap();
        let mutation = ws.assign_reviewers(&["user-1".to_owned()]).unwrap();
        persist(&repo, "run-1", &mutation).await.unwrap();

        let (_, reloaded) = repo.load_run("run-1").await.unwrap();
        let result = reloaded.iter().find(|r| r.id == "result-6").unwrap();
        assert_eq!(result.overall_status, OverallStatus::PreApproved);
        assert_eq!(result.review_history.len(), 1);

        let saved = load_saved(&repo, "run-1").await.unwrap();
        assert_eq!(saved.comments.len(), 1);
        assert!(saved.comments[0].1.is_system);
        assert_eq!(saved.reviewers.len(), 1);
    }

    #[tokio::test]
    async fn admin_listings_are_role_gated() {
        let repo = InMemoryRepository::seeded();
        let member = Session::new(repo.find_user("user-3").await.unwrap());
        let admin = Session::new(repo.find_user("user-5").await.unwrap());

        assert!(matches!(
            admin_users(&repo, &member).await,
            Err(ReviewError::Forbidden(_))
        ));
        assert_eq!(admin_users(&repo, &admin).await.unwrap().len(), 5);
        assert_eq!(admin_material_indexes(&repo, &admin).await.unwrap().len(), 3);
        assert!(admin_material_indexes(&repo, &member).await.is_err());
    }

    #[tokio::test]
    async fn project_lookups() {
        let repo = InMemoryRepository::seeded();
        assert_eq!(repo.list_projects().await.unwrap().len(), 5);
        let runs = repo.runs_for_project("proj-2").await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].id, "run-2");
        assert!(repo.runs_for_project("proj-3").await.unwrap().is_empty());
        assert!(repo.runs_for_project("proj-9").await.is_err());
        let (_, empty) = repo.load_run("run-2").await.unwrap();
        assert!(empty.is_empty());
        assert!(repo.find_run("run-9").await.is_err());
    }
}
