//! In-memory result store for one conformance run.
//!
//! Holds results in their original order. Mutations are limited to status
//! transitions, discrepancy approval, and history appends; results are never
//! removed.

use std::collections::{BTreeSet, HashSet};

use crate::error::{Result, ReviewError};
use crate::types::{
    ApprovalReason, ConformanceResult, Discrepancy, OverallStatus, ReviewAction,
    ReviewHistoryEntry,
};

/// Payload shared by single and batch discrepancy approval.
#[derive(Debug, Clone)]
pub struct Approval {
    pub reason: ApprovalReason,
    pub comment: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub approved_at: i64,
}

impl Approval {
    fn discrepancy(&self) -> Discrepancy {
        Discrepancy {
            approved: true,
            reason: Some(self.reason),
            comment: self.comment.clone(),
            approved_by: Some(self.user_name.clone()),
            approved_at: Some(self.approved_at),
        }
    }

    fn history_entry(&self) -> ReviewHistoryEntry {
        ReviewHistoryEntry {
            id: crate::new_id(),
            action: ReviewAction::Approved,
            comment: Some(format!("Discrepancy approved: {}", self.reason.label())),
            user_id: self.user_id.clone(),
            user_name: self.user_name.clone(),
            timestamp: self.approved_at,
        }
    }
}

/// Per-status totals shown in the report header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryCounts {
    pub pre_approved: usize,
    pub review_required: usize,
    pub action_mandatory: usize,
}

impl SummaryCounts {
    pub fn total(&self) -> usize {
        self.pre_approved + self.review_required + self.action_mandatory
    }

    pub fn get(&self, status: OverallStatus) -> usize {
        match status {
            OverallStatus::PreApproved => self.pre_approved,
            OverallStatus::ReviewRequired => self.review_required,
            OverallStatus::ActionMandatory => self.action_mandatory,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    results: Vec<ConformanceResult>,
}

impl ResultStore {
    pub fn new(results: Vec<ConformanceResult>) -> Self {
        Self { results }
    }

    pub fn all(&self) -> &[ConformanceResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ConformanceResult> {
        self.results.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut ConformanceResult> {
        self.results
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ReviewError::not_found("result", id))
    }

    /// Sets `next` as the overall status and appends `entry` to the history.
    ///
    /// Setting the current value is accepted; callers exclude it from choice lists.
    pub fn change_status(
        &mut self,
        id: &str,
        next: OverallStatus,
        entry: ReviewHistoryEntry,
    ) -> Result<&ConformanceResult> {
        let result = self.get_mut(id)?;
        result.overall_status = next;
        result.review_history.push(entry);
        Ok(result)
    }

    /// Marks the discrepancy on `id` approved, overwriting any earlier approval.
    pub fn approve(&mut self, id: &str, approval: &Approval) -> Result<&ConformanceResult> {
        let result = self.get_mut(id)?;
        result.discrepancy = Some(approval.discrepancy());
        result.review_history.push(approval.history_entry());
        Ok(result)
    }

    fn batch_eligible(result: &ConformanceResult, selected: &HashSet<String>) -> bool {
        selected.contains(&result.id)
            && result.overall_status.needs_review()
            && !result.is_discrepancy_approved()
    }

    /// Number of selected results a batch approval would touch.
    pub fn batch_approvable(&self, selected: &HashSet<String>) -> usize {
        self.results
            .iter()
            .filter(|r| Self::batch_eligible(r, selected))
            .count()
    }

    /// Approves every eligible selected result and returns the ids touched,
    /// in store order. Ineligible results are left untouched.
    pub fn batch_approve(&mut self, selected: &HashSet<String>, approval: &Approval) -> Vec<String> {
        let mut touched = Vec::new();
        for result in self.results.iter_mut() {
            if Self::batch_eligible(result, selected) {
                result.discrepancy = Some(approval.discrepancy());
                result.review_history.push(approval.history_entry());
                touched.push(result.id.clone());
            }
        }
        touched
    }

    pub fn append_history(&mut self, id: &str, entry: ReviewHistoryEntry) -> Result<()> {
        self.get_mut(id)?.review_history.push(entry);
        Ok(())
    }

    pub fn summary(&self) -> SummaryCounts {
        self.results
            .iter()
            .fold(SummaryCounts::default(), |mut counts, r| {
                match r.overall_status {
                    OverallStatus::PreApproved => counts.pre_approved += 1,
                    OverallStatus::ReviewRequired => counts.review_required += 1,
                    OverallStatus::ActionMandatory => counts.action_mandatory += 1,
                }
                counts
            })
    }

    /// Distinct divisions, sorted, for the division filter.
    pub fn divisions(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| r.division.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct system types, sorted, for the system-type filter.
    pub fn system_types(&self) -> Vec<String> {
        self.results
            .iter()
            .map(|r| r.system_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn approval() -> Approval {
        Approval {
            reason: ApprovalReason::EngineeringJudgment,
            comment: None,
            user_id: "user-2".into(),
            user_name: "Sarah Chen".into(),
            approved_at: 1_706_300_000,
        }
    }

    #[test]
    fn batch_approve_skips_pre_approved_and_already_approved() {
        let mut store = ResultStore::new(seed::demo_results());
        store.approve("result-6", &approval()).unwrap();
        let before = store.all().to_vec();

        // result-1 is Pre-Approved, result-6 is already approved, result-3 and -5 qualify.
        let selected: HashSet<String> = ["result-1", "result-3", "result-5", "result-6"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(store.batch_approvable(&selected), 2);

        let touched = store.batch_approve(&selected, &approval());
        assert_eq!(touched, vec!["result-3".to_owned(), "result-5".to_owned()]);

        for (old, new) in before.iter().zip(store.all()) {
            if touched.contains(&new.id) {
                assert!(new.is_discrepancy_approved());
                assert_eq!(new.overall_status, old.overall_status);
            } else {
                assert_eq!(old, new, "{} should be unchanged", new.id);
            }
        }
    }

    #[test]
    fn summary_counts_demo_run() {
        let store = ResultStore::new(seed::demo_results());
        let counts = store.summary();
        assert_eq!(counts.pre_approved, 6);
        assert_eq!(counts.review_required, 3);
        assert_eq!(counts.action_mandatory, 1);
        assert_eq!(counts.total(), store.len());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut store = ResultStore::new(seed::demo_results());
        let err = store.approve("result-99", &approval()).unwrap_err();
        assert!(matches!(err, ReviewError::NotFound { kind: "result", .. }));
    }

    #[test]
    fn filter_options_are_sorted_and_distinct() {
        let store = ResultStore::new(seed::demo_results());
        assert_eq!(
            store.divisions(),
            vec!["Division 21 - Fire Suppression", "Division 23 - HVAC"]
        );
        assert_eq!(store.system_types().len(), 10);
    }
}
