use async_trait::async_trait;
use reposignal_core::AppResult;
use reposignal_domain::{Actor, AuditEntry, Difficulty, IssueType, Rating, RepoRef};

/// Classification fields merged into one backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueClassification {
    /// Difficulty to set, when present.
    pub difficulty: Option<Difficulty>,
    /// Issue type to set, when present.
    pub issue_type: Option<IssueType>,
    /// Hidden flag to set, when present.
    pub hidden: Option<bool>,
}

/// One issue classification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyIssueRequest {
    /// Target repository.
    pub repo: RepoRef,
    /// Thread-local issue number.
    pub issue_number: u64,
    /// Fields to apply.
    pub classification: IssueClassification,
    /// Acting maintainer.
    pub actor: Actor,
}

/// One feedback submission. The shape carries no actor identity; the
/// contract enforces anonymity structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    /// Platform-assigned pull request id, the feedback correlation key.
    pub pull_request_id: u64,
    /// Repository the pull request belongs to.
    pub repo: RepoRef,
    /// Difficulty rating, when this submission carries one.
    pub difficulty_rating: Option<Rating>,
    /// Responsiveness rating, when this submission carries one.
    pub responsiveness_rating: Option<Rating>,
}

/// Port for the state-owning backend service.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Applies classification fields to one issue.
    async fn classify_issue(&self, request: ClassifyIssueRequest) -> AppResult<()>;

    /// Records one anonymous feedback submission. Duplicate submissions for
    /// the same pull request are rejected by the backend, not locally.
    async fn submit_feedback(&self, submission: FeedbackSubmission) -> AppResult<()>;

    /// Appends one write-once audit entry.
    async fn append_log(&self, entry: AuditEntry) -> AppResult<()>;
}
