//! End-to-end review scenarios over the seeded in-memory repository.

use conform_core::filter::ConformanceFilters;
use conform_core::notify::{Notice, RecordingNotifier};
use conform_core::repository::{self, InMemoryRepository, ResultRepository, UserRepository};
use conform_core::session::Session;
use conform_core::status;
use conform_core::types::{ApprovalReason, OverallStatus, ReviewAction};
use conform_core::workspace::ReviewWorkspace;

async fn open(user_id: &str) -> (InMemoryRepository, ReviewWorkspace, RecordingNotifier) {
    let repo = InMemoryRepository::seeded();
    let notifier = RecordingNotifier::default();
    let user = repo.find_user(user_id).await.unwrap();
    let directory = repo.list_users().await.unwrap();
    let (run, results) = repo.load_run("run-1").await.unwrap();
    let saved = repository::load_saved(&repo, "run-1").await.unwrap();
    let ws = ReviewWorkspace::new(run, results, directory, Session::new(user), Box::new(notifier.clone()))
        .with_saved(saved);
    (repo, ws, notifier)
}

#[tokio::test]
async fn reviewer_walks_every_open_item() {
    let (repo, mut ws, notices) = open("user-2").await;
    assert_eq!(ws.summary().review_required, 3);
    assert_eq!(ws.summary().action_mandatory, 1);

    // Every item still needing review is either approved or re-classified.
    let open_items: Vec<String> = ws
        .results()
        .iter()
        .filter(|r| r.overall_status.needs_review())
        .map(|r| r.id.clone())
        .collect();
    for id in &open_items {
        let current = ws.result(id).unwrap().overall_status;
        let next = status::allowed_transitions(current)[0];
        let m = ws.change_status(id, next, current).unwrap();
        repository::persist(&repo, "run-1", &m).await.unwrap();
    }

    let (_, stored) = repo.load_run("run-1").await.unwrap();
    for id in &open_items {
        let r = stored.iter().find(|r| &r.id == id).unwrap();
        assert_eq!(r.review_history.len(), 1);
        assert_eq!(r.review_history[0].action, ReviewAction::Reviewed);
        assert_eq!(ws.comment_count(id), 1);
    }
    assert_eq!(notices.notices().len(), open_items.len());
}

#[tokio::test]
async fn batch_approval_over_a_filtered_view() {
    let (_, mut ws, notices) = open("user-5").await;
    *ws.filters_mut() = ConformanceFilters {
        division: "Division 23 - HVAC".into(),
        ..ConformanceFilters::default()
    };
    ws.toggle_select_all();
    assert_eq!(ws.selection().len(), 8);
    assert_eq!(ws.batch_approvable_count(), 3);

    let m = ws.batch_approve(ApprovalReason::EngineeringJudgment, "Reviewed on site").unwrap();
    let ids: Vec<&str> = m.results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["result-5", "result-6", "result-9"]);
    assert!(ws.selection().is_empty());
    assert!(!ws.result("result-3").unwrap().is_discrepancy_approved());
    assert_eq!(
        notices.last(),
        Some(Notice::success("3 discrepancies approved successfully"))
    );
}

#[tokio::test]
async fn approval_requires_a_known_reason() {
    let err = "".parse::<ApprovalReason>().unwrap_err();
    assert_eq!(err.to_string(), "Please select a reason for approval");

    let (_, mut ws, _) = open("user-3").await;
    let reason: ApprovalReason = "customer-approved".parse().unwrap();
    ws.approve("result-3", reason, "").unwrap();
    let d = ws.result("result-3").unwrap().discrepancy.clone().unwrap();
    assert_eq!(d.approved_by.as_deref(), Some("Mike Johnson"));
    assert_eq!(d.reason.map(|r| r.label()), Some("Customer approved substitution"));
    assert_eq!(ws.result("result-3").unwrap().overall_status, OverallStatus::ReviewRequired);
}
