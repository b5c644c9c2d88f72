mod backend;
mod github;
mod queue;

pub use backend::{BackendClient, ClassifyIssueRequest, FeedbackSubmission, IssueClassification};
pub use github::{GithubClient, PostedComment};
pub use queue::{ClaimedCleanupJob, CleanupQueue};
