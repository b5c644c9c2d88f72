//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod actor;
mod audit;
mod cleanup;
mod command;
mod thread;

pub use actor::{Actor, ActorRole, PermissionLevel};
pub use audit::AuditEntry;
pub use cleanup::{
    BackoffOptions, CLEANUP_BACKOFF_BASE, CLEANUP_MAX_ATTEMPTS, CLEANUP_QUEUE_CHANNEL, CleanupJob,
    CleanupJobOptions, CleanupVerdict, DELETE_COMMENT_JOB, EXCHANGE_SWEEP_DELAY,
    ISSUE_NUDGE_SWEEP_DELAY, MERGE_NUDGE_SWEEP_DELAY, RetryPolicy,
};
pub use command::{
    COMMAND_TRIGGER, ClassificationBatch, Command, CommandBatch, Difficulty, IssueType,
    RateCommand, Rating, parse_comment,
};
pub use thread::{InstallationId, PullRequestSnapshot, RepoRef, ThreadKind, ThreadRef};
