//! Integration test for the SQLite repository lifecycle.
//!
//! Exercises: open_db, migrate, seed_if_empty, load_run, save_result,
//! append_comment/load_comments, save_reviewers/load_reviewers, and reopening
//! the same file through a second connection.

use conform_core::db::{self, SqliteRepository};
use conform_core::notify::NullNotifier;
use conform_core::repository::{self, ProjectRepository, ResultRepository, UserRepository};
use conform_core::session::Session;
use conform_core::types::{ApprovalReason, OverallStatus, RunStatus};
use conform_core::workspace::ReviewWorkspace;

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("test.db");
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn schema_is_created_in_wal_mode() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, 1, "schema_version should be 1");

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    let results_pk: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT COUNT(*) FROM pragma_table_info('results') WHERE pk > 0",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(results_pk, 2, "results should have composite PK (run_id, id)");

    // Migrating an already-current file is a no-op.
    drop(conn);
    let conn = db::open_db(&path).await.unwrap();
    let rows: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(
                db.query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))?,
            )
        })
        .await
        .unwrap();
    assert_eq!(rows, 1, "migration should run once");
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let path = temp_db_path();
    let repo = SqliteRepository::open(&path).await.unwrap();

    assert!(repo.seed_if_empty().await.unwrap(), "first open seeds");
    assert!(!repo.seed_if_empty().await.unwrap(), "second open keeps data");

    let users = repo.list_users().await.unwrap();
    assert_eq!(users.len(), 5);
    assert_eq!(repo.list_projects().await.unwrap().len(), 5);

    let (run, results) = repo.load_run("run-1").await.unwrap();
    assert_eq!(run.status, RunStatus::ReadyForReview);
    assert_eq!(results.len(), 10);
    assert_eq!(results[0].id, "result-1");
    assert_eq!(results[9].id, "result-10");
    assert_eq!(results[8].project_spec_evidence[0].page_references, vec![195]);

    let runs = repo.runs_for_project("proj-2").await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Processing);

    let indexes = repo.material_index_versions().await.unwrap();
    assert_eq!(indexes[0].version_number, "v2.1");
    assert!(indexes[0].is_active);

    assert!(repo.find_user("user-99").await.is_err());
    assert!(repo.find_run("run-9").await.is_err());
    assert!(repo.load_run("run-9").await.is_err());
}

#[tokio::test]
async fn review_state_persists_across_connections() {
    let path = temp_db_path();
    let repo = SqliteRepository::open(&path).await.unwrap();
    repo.seed_if_empty().await.unwrap();

    let user = repo.find_user("user-1").await.unwrap();
    let directory = repo.list_users().await.unwrap();
    let (run, results) = repo.load_run("run-1").await.unwrap();
    let mut ws = ReviewWorkspace::new(run, results, directory, Session::new(user), Box::new(NullNotifier));

    let m = ws
        .change_status("result-9", OverallStatus::ActionMandatory, OverallStatus::ReviewRequired)
        .unwrap();
    repository::persist(&repo, "run-1", &m).await.unwrap();

    let m = ws.approve("result-5", ApprovalReason::Equivalent, "Same R-value per addendum").unwrap();
    repository::persist(&repo, "run-1", &m).await.unwrap();

    let m = ws.add_comment("result-5", "Looks fine @Sarah Chen", None).unwrap();
    let root_id = m.comments[0].1.id.clone();
    repository::persist(&repo, "run-1", &m).await.unwrap();
    let m = ws.add_comment("result-5", "Agreed", Some(&root_id)).unwrap();
    repository::persist(&repo, "run-1", &m).await.unwrap();

    let m = ws
        .assign_reviewers(&["user-2".to_owned(), "user-3".to_owned()])
        .unwrap();
    repository::persist(&repo, "run-1", &m).await.unwrap();
    let m = ws.remove_reviewer("user-2").unwrap();
    repository::persist(&repo, "run-1", &m).await.unwrap();

    // Second connection to the same file sees every write.
    let reopened = SqliteRepository::open(&path).await.unwrap();
    let (_, results) = reopened.load_run("run-1").await.unwrap();
    let r9 = results.iter().find(|r| r.id == "result-9").unwrap();
    assert_eq!(r9.overall_status, OverallStatus::ActionMandatory);
    assert_eq!(r9.review_history.len(), 1);

    let r5 = results.iter().find(|r| r.id == "result-5").unwrap();
    assert_eq!(r5.overall_status, OverallStatus::ActionMandatory);
    assert!(r5.is_discrepancy_approved());
    // approval + two comments
    assert_eq!(r5.review_history.len(), 3);

    let saved = repository::load_saved(&reopened, "run-1").await.unwrap();
    assert_eq!(saved.comments.len(), 3, "system comment plus root and reply");
    let (item, root) = &saved.comments[1];
    assert_eq!(item, "result-5");
    assert_eq!(root.mentions, vec!["user-2".to_owned()]);
    assert_eq!(saved.comments[2].1.parent_id.as_deref(), Some(root_id.as_str()));
    assert_eq!(saved.reviewers.len(), 1);
    assert_eq!(saved.reviewers[0].name, "Mike Johnson");

    // A restored workspace rebuilds the threads.
    let user = reopened.find_user("user-1").await.unwrap();
    let directory = reopened.list_users().await.unwrap();
    let (run, results) = reopened.load_run("run-1").await.unwrap();
    let ws = ReviewWorkspace::new(run, results, directory, Session::new(user), Box::new(NullNotifier))
        .with_saved(saved);
    let thread = ws.thread("result-5");
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].replies.len(), 1);
    assert_eq!(ws.reviewers().len(), 1);
}

#[tokio::test]
async fn saving_unknown_result_is_not_found() {
    let path = temp_db_path();
    let repo = SqliteRepository::open(&path).await.unwrap();
    repo.seed_if_empty().await.unwrap();

    let (_, mut results) = repo.load_run("run-1").await.unwrap();
    let mut ghost = results.remove(0);
    ghost.id = "result-404".into();
    let err = repo.save_result("run-1", &ghost).await.unwrap_err();
    assert!(matches!(err, conform_core::ReviewError::NotFound { .. }));
}
