//! Domain records for conformance review.
//!
//! All records are fully owned so they can cross from the UI thread to the
//! background worker and into the SQLite layer without borrowing. Timestamps
//! are Unix seconds; ids for records created at runtime are UUID v4 text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReviewError;

/// Overall conformance verdict for one submittal item.
///
/// Every value can move to either of the other two; see [`crate::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverallStatus {
    PreApproved,
    ReviewRequired,
    ActionMandatory,
}

impl OverallStatus {
    pub const ALL: [OverallStatus; 3] = [
        OverallStatus::PreApproved,
        OverallStatus::ReviewRequired,
        OverallStatus::ActionMandatory,
    ];

    /// Human-readable label, e.g. `"Review Required"`.
    pub fn label(self) -> &'static str {
        match self {
            OverallStatus::PreApproved => "Pre-Approved",
            OverallStatus::ReviewRequired => "Review Required",
            OverallStatus::ActionMandatory => "Action Mandatory",
        }
    }

    /// Storage code used in the `results.overall_status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::PreApproved => "pre-approved",
            OverallStatus::ReviewRequired => "review-required",
            OverallStatus::ActionMandatory => "action-mandatory",
        }
    }

    /// True for the statuses whose discrepancies may be approved.
    pub fn needs_review(self) -> bool {
        matches!(self, OverallStatus::ReviewRequired | OverallStatus::ActionMandatory)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OverallStatus {
    type Err = ReviewError;

    /// Accepts either the storage code or the display label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OverallStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s || status.label() == s)
            .ok_or_else(|| ReviewError::validation(format!("unknown status '{s}'")))
    }
}

/// Verdict attached to a single piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceStatus {
    Match,
    PotentialIssue,
    Discrepancy,
}

impl EvidenceStatus {
    pub fn label(self) -> &'static str {
        match self {
            EvidenceStatus::Match => "Match",
            EvidenceStatus::PotentialIssue => "Potential Issue",
            EvidenceStatus::Discrepancy => "Discrepancy",
        }
    }
}

/// Quoted fragments backing a match, issue, or discrepancy judgment.
///
/// `chunks[i]` is paired with `page_references[i]`; the two lists are not
/// required to have the same length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub status: EvidenceStatus,
    pub chunks: Vec<String>,
    pub page_references: Vec<u32>,
    pub explanation: String,
}

/// Fixed set of reasons a reviewer may give when approving a discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalReason {
    Equivalent,
    CustomerApproved,
    EngineeringJudgment,
    Other,
}

impl ApprovalReason {
    pub const ALL: [ApprovalReason; 4] = [
        ApprovalReason::Equivalent,
        ApprovalReason::CustomerApproved,
        ApprovalReason::EngineeringJudgment,
        ApprovalReason::Other,
    ];

    /// Option value, e.g. `"customer-approved"`.
    pub fn value(self) -> &'static str {
        match self {
            ApprovalReason::Equivalent => "equivalent",
            ApprovalReason::CustomerApproved => "customer-approved",
            ApprovalReason::EngineeringJudgment => "engineering-judgment",
            ApprovalReason::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApprovalReason::Equivalent => "Equivalent product",
            ApprovalReason::CustomerApproved => "Customer approved substitution",
            ApprovalReason::EngineeringJudgment => "Engineering judgment",
            ApprovalReason::Other => "Other",
        }
    }
}

impl FromStr for ApprovalReason {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApprovalReason::ALL
            .into_iter()
            .find(|reason| reason.value() == s.trim())
            .ok_or_else(|| ReviewError::validation("Please select a reason for approval"))
    }
}

/// Audit record written when a reviewer accepts a discrepancy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Discrepancy {
    pub approved: bool,
    pub reason: Option<ApprovalReason>,
    pub comment: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentStatus {
    Pending,
    InReview,
    Completed,
}

/// Per-item reviewer assignment carried by imported results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAssignment {
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub assigned_by: String,
    pub assigned_at: i64,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewAction {
    Comment,
    Reviewed,
    Approved,
    Rejected,
    Assigned,
}

impl ReviewAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewAction::Comment => "comment",
            ReviewAction::Reviewed => "reviewed",
            ReviewAction::Approved => "approved",
            ReviewAction::Rejected => "rejected",
            ReviewAction::Assigned => "assigned",
        }
    }
}

impl FromStr for ReviewAction {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ReviewAction::Comment,
            ReviewAction::Reviewed,
            ReviewAction::Approved,
            ReviewAction::Rejected,
            ReviewAction::Assigned,
        ]
        .into_iter()
        .find(|action| action.as_str() == s)
        .ok_or_else(|| ReviewError::validation(format!("unknown review action '{s}'")))
    }
}

/// One line of a result's append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewHistoryEntry {
    pub id: String,
    pub action: ReviewAction,
    pub comment: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub timestamp: i64,
}

/// Coarse grouping of a confidence score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=u8::MAX => ConfidenceBand::High,
            70..=89 => ConfidenceBand::Medium,
            _ => ConfidenceBand::Low,
        }
    }
}

/// One analysed submittal item and everything reviewers have done to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceResult {
    pub id: String,
    pub material_description: String,
    pub spec_section: String,
    pub division: String,
    pub system_type: String,
    pub overall_status: OverallStatus,
    /// 0..=100.
    pub confidence_score: u8,
    pub project_spec_evidence: Vec<Evidence>,
    pub material_index_evidence: Vec<Evidence>,
    pub discrepancy: Option<Discrepancy>,
    pub review_assignment: Option<ReviewAssignment>,
    pub review_history: Vec<ReviewHistoryEntry>,
}

impl ConformanceResult {
    pub fn is_discrepancy_approved(&self) -> bool {
        self.discrepancy.as_ref().is_some_and(|d| d.approved)
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.confidence_score)
    }
}

/// A comment on one result. Replies carry the id of their root comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemComment {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub timestamp: i64,
    pub status_at_time: Option<OverallStatus>,
    pub is_system: bool,
    pub parent_id: Option<String>,
    /// User ids mentioned in `text`.
    pub mentions: Vec<String>,
}

/// A reviewer assigned at run level (not per item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: String,
    pub name: String,
    pub assigned_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserStatus {
    Active,
    Pending,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub assigned_projects: Vec<String>,
}

impl User {
    /// `"First Last"`, the form used for attribution and @mentions.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Planning,
    Active,
    OnHold,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub job_id: String,
    pub location: String,
    pub status: ProjectStatus,
    pub created_by: String,
    pub created_at: i64,
}

/// Lifecycle of one conformance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Uploading,
    Processing,
    ReadyForReview,
    Completed,
}

impl RunStatus {
    pub fn label(self) -> &'static str {
        match self {
            RunStatus::Uploading => "Uploading",
            RunStatus::Processing => "Processing",
            RunStatus::ReadyForReview => "Ready for Review",
            RunStatus::Completed => "Completed",
        }
    }
}

/// One batch analysis pass over a project's submittal documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceRun {
    pub id: String,
    pub project_id: String,
    pub version: u32,
    pub status: RunStatus,
    pub material_index_version: String,
    pub created_by: String,
    pub created_at: i64,
}

/// An admin-curated baseline list of pre-approved materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialIndexVersion {
    pub id: String,
    pub version_number: String,
    pub name: String,
    pub is_active: bool,
    pub uploaded_by: String,
    pub uploaded_at: i64,
    pub item_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_label_and_code() {
        assert_eq!("Review Required".parse::<OverallStatus>().unwrap(), OverallStatus::ReviewRequired);
        assert_eq!("action-mandatory".parse::<OverallStatus>().unwrap(), OverallStatus::ActionMandatory);
        assert!("Approved".parse::<OverallStatus>().is_err());
    }

    #[test]
    fn empty_reason_is_a_validation_error() {
        let err = "".parse::<ApprovalReason>().unwrap_err();
        assert_eq!(err.to_string(), "Please select a reason for approval");
        assert_eq!("equivalent".parse::<ApprovalReason>().unwrap(), ApprovalReason::Equivalent);
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceBand::from_score(98), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(90), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(72), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::from_score(45), ConfidenceBand::Low);
    }
}
