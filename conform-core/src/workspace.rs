//! The conformance review workspace for one run.
//!
//! Owns the result store, comment threads, reviewer assignments, filters, and
//! selection, and coordinates them on behalf of the session user. Every
//! mutating operation reports the records it touched as a [`Mutation`] so the
//! caller can persist them through a repository; the workspace itself never
//! performs I/O.
//!
//! All mutation is synchronous and single-writer.

use tracing::{debug, info};

use crate::citation::{self, Citation, CitationPager};
use crate::comments::{self, CommentStore, Thread};
use crate::error::{Result, ReviewError};
use crate::filter::{ConformanceFilters, Selection};
use crate::mentions;
use crate::notify::{Notice, Notifier};
use crate::reviewers::{self, ReviewerAssignments};
use crate::session::Session;
use crate::status;
use crate::store::{Approval, ResultStore, SummaryCounts};
use crate::types::{
    ApprovalReason, ConformanceResult, ConformanceRun, ItemComment, OverallStatus, Reviewer,
    ReviewAction, ReviewHistoryEntry, User,
};

/// Records changed by one workspace operation, ready to be persisted.
#[derive(Debug, Clone, Default)]
pub struct Mutation {
    /// Full snapshots of every result whose state changed.
    pub results: Vec<ConformanceResult>,
    /// Newly appended comments as `(item_id, comment)`.
    pub comments: Vec<(String, ItemComment)>,
    /// The complete reviewer list, when it changed.
    pub reviewers: Option<Vec<Reviewer>>,
}

impl Mutation {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.comments.is_empty() && self.reviewers.is_none()
    }
}

/// Previously persisted per-run state used to restore a workspace.
#[derive(Debug, Clone, Default)]
pub struct SavedState {
    pub comments: Vec<(String, ItemComment)>,
    pub reviewers: Vec<Reviewer>,
}

pub struct ReviewWorkspace {
    run: ConformanceRun,
    store: ResultStore,
    comments: CommentStore,
    reviewers: ReviewerAssignments,
    filters: ConformanceFilters,
    selection: Selection,
    focused: Option<String>,
    directory: Vec<User>,
    session: Session,
    notifier: Box<dyn Notifier>,
}

impl ReviewWorkspace {
    pub fn new(
        run: ConformanceRun,
        results: Vec<ConformanceResult>,
        directory: Vec<User>,
        session: Session,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            run,
            store: ResultStore::new(results),
            comments: CommentStore::default(),
            reviewers: ReviewerAssignments::default(),
            filters: ConformanceFilters::default(),
            selection: Selection::default(),
            focused: None,
            directory,
            session,
            notifier,
        }
    }

    /// Restores comments and reviewers loaded from a repository.
    pub fn with_saved(mut self, saved: SavedState) -> Self {
        self.comments = CommentStore::from_entries(saved.comments);
        self.reviewers = ReviewerAssignments::new(saved.reviewers);
        self
    }

    pub fn run(&self) -> &ConformanceRun {
        &self.run
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn directory(&self) -> &[User] {
        &self.directory
    }

    pub fn results(&self) -> &[ConformanceResult] {
        self.store.all()
    }

    pub fn result(&self, id: &str) -> Option<&ConformanceResult> {
        self.store.get(id)
    }

    pub fn summary(&self) -> SummaryCounts {
        self.store.summary()
    }

    pub fn divisions(&self) -> Vec<String> {
        self.store.divisions()
    }

    pub fn system_types(&self) -> Vec<String> {
        self.store.system_types()
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    fn history_entry(&self, action: ReviewAction, comment: String, timestamp: i64) -> ReviewHistoryEntry {
        ReviewHistoryEntry {
            id: crate::new_id(),
            action,
            comment: Some(comment),
            user_id: self.session.user_id().to_owned(),
            user_name: self.session.display_name(),
            timestamp,
        }
    }

    fn approval(&self, reason: ApprovalReason, comment: &str) -> Approval {
        let comment = comment.trim();
        Approval {
            reason,
            comment: (!comment.is_empty()).then(|| comment.to_owned()),
            user_id: self.session.user_id().to_owned(),
            user_name: self.session.display_name(),
            approved_at: crate::now_secs(),
        }
    }

    // -----------------------------------------------------------------------
    // Filters, selection, focus
    // -----------------------------------------------------------------------

    pub fn filters(&self) -> &ConformanceFilters {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut ConformanceFilters {
        &mut self.filters
    }

    pub fn filtered(&self) -> Vec<&ConformanceResult> {
        self.filters.apply(self.store.all())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_select(&mut self, id: &str) {
        self.selection.toggle(id);
    }

    pub fn toggle_select_all(&mut self) {
        let visible = self.filters.apply(self.store.all());
        self.selection.toggle_all(visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn focus(&mut self, id: &str) -> Result<()> {
        if self.store.get(id).is_none() {
            return Err(ReviewError::not_found("result", id));
        }
        self.focused = Some(id.to_owned());
        Ok(())
    }

    /// Drops the focus, e.g. when the filtered view is empty.
    pub fn clear_focus(&mut self) {
        self.focused = None;
    }

    pub fn focused(&self) -> Option<&ConformanceResult> {
        self.focused.as_deref().and_then(|id| self.store.get(id))
    }

    pub fn thread(&self, item_id: &str) -> Vec<Thread<'_>> {
        self.comments.thread(item_id)
    }

    pub fn comment_count(&self, item_id: &str) -> usize {
        self.comments.count(item_id)
    }

    pub fn citations(&self, item_id: &str) -> Result<Vec<Citation>> {
        self.store
            .get(item_id)
            .map(citation::project)
            .ok_or_else(|| ReviewError::not_found("result", item_id))
    }

    /// Opens a citation pager for `item_id` at `page`.
    pub fn open_citations(&self, item_id: &str, page: u32) -> Result<CitationPager> {
        Ok(CitationPager::new(self.citations(item_id)?, page))
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Moves `item_id` to `next`, recording one history entry and one system
    /// comment that both describe the transition.
    pub fn change_status(
        &mut self,
        item_id: &str,
        next: OverallStatus,
        previous: OverallStatus,
    ) -> Result<Mutation> {
        if !status::can_transition(previous, next) {
            return Err(ReviewError::validation(format!("Status is already {next}")));
        }
        let now = crate::now_secs();
        let message = status::transition_message(previous, next);
        let entry = self.history_entry(ReviewAction::Reviewed, message.clone(), now);
        let snapshot = self.store.change_status(item_id, next, entry)?.clone();

        let system = comments::system_comment(message, next, now);
        let system = self.comments.add(item_id, system)?.clone();

        info!(item_id, from = %previous, to = %next, "status changed");
        self.notify(Notice::success(format!("Status updated to {next}")));

        Ok(Mutation {
            results: vec![snapshot],
            comments: vec![(item_id.to_owned(), system)],
            reviewers: None,
        })
    }

    // -----------------------------------------------------------------------
    // Discrepancy approval
    // -----------------------------------------------------------------------

    pub fn approve(&mut self, item_id: &str, reason: ApprovalReason, comment: &str) -> Result<Mutation> {
        let approval = self.approval(reason, comment);
        let snapshot = self.store.approve(item_id, &approval)?.clone();
        info!(item_id, reason = reason.value(), "discrepancy approved");
        self.notify(Notice::success("Discrepancy approved successfully"));
        Ok(Mutation { results: vec![snapshot], ..Mutation::default() })
    }

    /// Selected items a batch approval would affect.
    pub fn batch_approvable_count(&self) -> usize {
        self.store.batch_approvable(self.selection.ids())
    }

    /// Approves every selected item still needing review, then clears the selection.
    pub fn batch_approve(&mut self, reason: ApprovalReason, comment: &str) -> Result<Mutation> {
        let approval = self.approval(reason, comment);
        let touched = self.store.batch_approve(self.selection.ids(), &approval);
        self.selection.clear();

        info!(count = touched.len(), reason = reason.value(), "batch approval");
        let results: Vec<ConformanceResult> = touched
            .iter()
            .filter_map(|id| self.store.get(id).cloned())
            .collect();
        if results.is_empty() {
            self.notify(Notice::info("No selected items need approval"));
        } else {
            self.notify(Notice::success(format!(
                "{} discrepancies approved successfully",
                results.len()
            )));
        }
        Ok(Mutation { results, ..Mutation::default() })
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Adds a comment (or a reply when `parent_id` is set) by the session user.
    ///
    /// Mentions are resolved against the user directory; a `comment` history
    /// entry is appended to the result.
    pub fn add_comment(&mut self, item_id: &str, text: &str, parent_id: Option<&str>) -> Result<Mutation> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReviewError::validation("Comment text cannot be empty"));
        }
        let status_at_time = self
            .store
            .get(item_id)
            .map(|r| r.overall_status)
            .ok_or_else(|| ReviewError::not_found("result", item_id))?;

        let now = crate::now_secs();
        let comment = ItemComment {
            id: crate::new_id(),
            text: text.to_owned(),
            author_id: self.session.user_id().to_owned(),
            author_name: self.session.display_name(),
            timestamp: now,
            status_at_time: Some(status_at_time),
            is_system: false,
            parent_id: parent_id.map(str::to_owned),
            mentions: mentions::extract_mentions(text, &self.directory),
        };
        let comment = self.comments.add(item_id, comment)?.clone();

        let entry = self.history_entry(ReviewAction::Comment, text.to_owned(), now);
        self.store.append_history(item_id, entry)?;
        let snapshot = self.store.get(item_id).cloned();

        debug!(item_id, mentions = comment.mentions.len(), reply = parent_id.is_some(), "comment added");

        Ok(Mutation {
            results: snapshot.into_iter().collect(),
            comments: vec![(item_id.to_owned(), comment)],
            reviewers: None,
        })
    }

    // -----------------------------------------------------------------------
    // Reviewers
    // -----------------------------------------------------------------------

    pub fn reviewers(&self) -> &[Reviewer] {
        self.reviewers.list()
    }

    pub fn available_reviewers(&self, query: &str) -> Vec<&User> {
        self.reviewers.available(&self.directory, query)
    }

    /// Assigns the given user ids as run reviewers; already-assigned ids are skipped.
    pub fn assign_reviewers(&mut self, user_ids: &[String]) -> Result<Mutation> {
        let mut users = Vec::with_capacity(user_ids.len());
        for id in user_ids {
            let user = self
                .directory
                .iter()
                .find(|u| &u.id == id)
                .ok_or_else(|| ReviewError::not_found("user", id.as_str()))?;
            users.push(user);
        }
        let added = self.reviewers.assign(users, crate::now_secs());
        if added.is_empty() {
            return Ok(Mutation::default());
        }
        info!(count = added.len(), run_id = %self.run.id, "reviewers assigned");
        self.notify(Notice::success(reviewers::assigned_message(&added)));
        Ok(Mutation {
            reviewers: Some(self.reviewers.list().to_vec()),
            ..Mutation::default()
        })
    }

    pub fn remove_reviewer(&mut self, user_id: &str) -> Result<Mutation> {
        let removed = self
            .reviewers
            .remove(user_id)
            .ok_or_else(|| ReviewError::not_found("reviewer", user_id))?;
        info!(reviewer = %removed.id, run_id = %self.run.id, "reviewer removed");
        self.notify(Notice::success(format!("Removed {} from reviewers", removed.name)));
        Ok(Mutation {
            reviewers: Some(self.reviewers.list().to_vec()),
            ..Mutation::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::seed;

    fn workspace() -> (ReviewWorkspace, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let users = seed::demo_users();
        let session = Session::new(users[1].clone());
        let ws = ReviewWorkspace::new(
            seed::demo_run(),
            seed::demo_results(),
            users,
            session,
            Box::new(notifier.clone()),
        );
        (ws, notifier)
    }

    #[test]
    fn status_change_appends_one_entry_and_one_system_comment() {
        let (mut ws, notices) = workspace();
        let mutation = ws
            .change_status("result-3", OverallStatus::ActionMandatory, OverallStatus::ReviewRequired)
            .unwrap();

        let result = ws.result("result-3").unwrap();
        assert_eq!(result.overall_status, OverallStatus::ActionMandatory);
        assert_eq!(result.review_history.len(), 1);
        let entry = &result.review_history[0];
        assert_eq!(entry.action, ReviewAction::Reviewed);
        assert_eq!(
            entry.comment.as_deref(),
            Some("Status changed from Review Required to Action Mandatory")
        );
        assert_eq!(entry.user_name, "Sarah Chen");

        let thread = ws.thread("result-3");
        assert_eq!(thread.len(), 1);
        assert!(thread[0].root.is_system);
        assert_eq!(thread[0].root.author_name, "System");
        assert_eq!(thread[0].root.status_at_time, Some(OverallStatus::ActionMandatory));

        assert_eq!(mutation.results.len(), 1);
        assert_eq!(mutation.comments.len(), 1);
        assert_eq!(
            notices.last(),
            Some(Notice::success("Status updated to Action Mandatory"))
        );

        // A second call appends exactly one more of each.
        ws.change_status("result-3", OverallStatus::PreApproved, OverallStatus::ActionMandatory)
            .unwrap();
        assert_eq!(ws.result("result-3").unwrap().review_history.len(), 2);
        assert_eq!(ws.comment_count("result-3"), 2);
    }

    #[test]
    fn status_change_on_unknown_item_changes_nothing() {
        let (mut ws, notices) = workspace();
        let err = ws
            .change_status("result-42", OverallStatus::PreApproved, OverallStatus::ReviewRequired)
            .unwrap_err();
        assert!(matches!(err, ReviewError::NotFound { .. }));
        assert_eq!(ws.comment_count("result-42"), 0);
        assert!(notices.notices().is_empty());
    }

    #[test]
    fn status_change_to_the_same_status_is_rejected() {
        let (mut ws, notices) = workspace();
        let err = ws
            .change_status("result-3", OverallStatus::ReviewRequired, OverallStatus::ReviewRequired)
            .unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        assert!(ws.result("result-3").unwrap().review_history.is_empty());
        assert_eq!(ws.comment_count("result-3"), 0);
        assert!(notices.notices().is_empty());
    }

    #[test]
    fn approving_equivalent_product_keeps_status() {
        let (mut ws, _) = workspace();
        let reason: ApprovalReason = "equivalent".parse().unwrap();
        ws.approve("result-5", reason, "Approve status with reason 'equivalent product'")
            .unwrap();

        let result = ws.result("result-5").unwrap();
        assert_eq!(result.overall_status, OverallStatus::ActionMandatory);
        let discrepancy = result.discrepancy.as_ref().unwrap();
        assert!(discrepancy.approved);
        assert_eq!(discrepancy.reason, Some(ApprovalReason::Equivalent));
        assert_eq!(discrepancy.reason.map(ApprovalReason::value), Some("equivalent"));
        assert_eq!(discrepancy.approved_by.as_deref(), Some("Sarah Chen"));
        assert!(discrepancy.approved_at.is_some());
    }

    #[test]
    fn blank_approval_comment_is_stored_as_none() {
        let (mut ws, _) = workspace();
        ws.approve("result-6", ApprovalReason::Other, "   ").unwrap();
        let discrepancy = ws.result("result-6").unwrap().discrepancy.clone().unwrap();
        assert_eq!(discrepancy.comment, None);
    }

    #[test]
    fn batch_approve_clears_selection_and_reports_count() {
        let (mut ws, notices) = workspace();
        for id in ["result-1", "result-3", "result-5", "result-9"] {
            ws.toggle_select(id);
        }
        assert_eq!(ws.batch_approvable_count(), 3);

        let mutation = ws.batch_approve(ApprovalReason::CustomerApproved, "").unwrap();
        assert_eq!(mutation.results.len(), 3);
        assert!(ws.selection().is_empty());
        assert!(!ws.result("result-1").unwrap().is_discrepancy_approved());
        assert!(ws.result("result-9").unwrap().is_discrepancy_approved());
        assert_eq!(
            notices.last(),
            Some(Notice::success("3 discrepancies approved successfully"))
        );

        // Nothing left to approve in the same selection.
        ws.toggle_select("result-3");
        assert_eq!(ws.batch_approvable_count(), 0);
    }

    #[test]
    fn comments_resolve_mentions_and_record_history() {
        let (mut ws, _) = workspace();
        let mutation = ws
            .add_comment("result-6", "  @Mike Johnson can you confirm the ERV?  ", None)
            .unwrap();
        let (item_id, root) = &mutation.comments[0];
        assert_eq!(item_id, "result-6");
        assert_eq!(root.text, "@Mike Johnson can you confirm the ERV?");
        assert_eq!(root.mentions, vec!["user-3".to_owned()]);
        assert_eq!(root.status_at_time, Some(OverallStatus::ReviewRequired));

        ws.add_comment("result-6", "Confirmed, ERV included.", Some(&root.id)).unwrap();
        let thread = ws.thread("result-6");
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].replies.len(), 1);

        let history = &ws.result("result-6").unwrap().review_history;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|h| h.action == ReviewAction::Comment));
    }

    #[test]
    fn empty_comment_is_rejected() {
        let (mut ws, _) = workspace();
        let err = ws.add_comment("result-1", "   ", None).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        assert!(ws.result("result-1").unwrap().review_history.is_empty());
    }

    #[test]
    fn reviewers_are_assigned_and_removed() {
        let (mut ws, notices) = workspace();
        let mutation = ws
            .assign_reviewers(&["user-3".to_owned(), "user-5".to_owned()])
            .unwrap();
        assert_eq!(mutation.reviewers.as_ref().map(Vec::len), Some(2));
        assert_eq!(
            notices.last().map(|n| n.message),
            Some("Assigned reviewers: Mike Johnson, Robert Wilson".to_owned())
        );

        let again = ws.assign_reviewers(&["user-3".to_owned()]).unwrap();
        assert!(again.is_empty());

        ws.remove_reviewer("user-3").unwrap();
        assert_eq!(ws.reviewers().len(), 1);
        assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Success));
        assert!(ws.remove_reviewer("user-3").is_err());
        assert!(ws.assign_reviewers(&["user-99".to_owned()]).is_err());
    }

    #[test]
    fn select_all_tracks_the_filtered_view() {
        let (mut ws, _) = workspace();
        ws.filters_mut().toggle_status(OverallStatus::ReviewRequired);
        ws.toggle_select_all();
        assert_eq!(ws.selection().len(), 3);
        ws.toggle_select_all();
        assert!(ws.selection().is_empty());
    }

    #[test]
    fn citations_for_focused_item() {
        let (mut ws, _) = workspace();
        assert!(ws.focused().is_none());
        ws.focus("result-5").unwrap();
        let id = ws.focused().map(|r| r.id.clone()).unwrap();
        let pager = ws.open_citations(&id, 178).unwrap();
        assert_eq!(pager.page(), 178);
        assert_eq!(pager.citations().len(), 3);
        assert!(ws.focus("nope").is_err());
    }
}
