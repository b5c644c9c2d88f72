//! Application services and ports.

#![forbid(unsafe_code)]

mod cleanup_service;
mod command_service;
mod nudge_service;
mod ports;

pub use cleanup_service::{CleanupOutcome, CleanupService};
pub use command_service::{CommandService, CommentEvent, Decision};
pub use nudge_service::{IssueOpened, NudgeService, PullRequestMerged};
pub use ports::{
    BackendClient, ClaimedCleanupJob, ClassifyIssueRequest, CleanupQueue, FeedbackSubmission,
    GithubClient, IssueClassification, PostedComment,
};
