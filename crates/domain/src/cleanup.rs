use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::thread::{InstallationId, RepoRef};

/// Queue channel shared with interoperating cleanup workers.
pub const CLEANUP_QUEUE_CHANNEL: &str = "reposignal-cleanup";

/// Job name for comment deletion jobs on the cleanup queue.
pub const DELETE_COMMENT_JOB: &str = "delete-comment";

/// Sweep delay for every command/confirmation exchange message.
pub const EXCHANGE_SWEEP_DELAY: Duration = Duration::from_secs(60);

/// Sweep delay for the classification nudge posted on newly opened issues.
pub const ISSUE_NUDGE_SWEEP_DELAY: Duration = Duration::from_secs(300);

/// Sweep delay for the feedback nudge posted on merged pull requests.
pub const MERGE_NUDGE_SWEEP_DELAY: Duration = Duration::from_secs(3_600);

/// Total execution attempts before a cleanup job goes terminal.
pub const CLEANUP_MAX_ATTEMPTS: u32 = 3;

/// Base delay for the doubling cleanup backoff.
pub const CLEANUP_BACKOFF_BASE: Duration = Duration::from_secs(5);

/// One scheduled deletion of one ephemeral message. The wire shape is shared
/// with interoperating workers and must not change field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupJob {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Target comment id.
    pub comment_id: u64,
    /// Thread number the comment lives on, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    /// Installation authorizing the deletion.
    pub installation_id: u64,
}

impl CleanupJob {
    /// Creates a job targeting one comment.
    #[must_use]
    pub fn for_comment(
        repo: &RepoRef,
        comment_id: u64,
        issue_number: Option<u64>,
        installation: InstallationId,
    ) -> Self {
        Self {
            owner: repo.owner().to_owned(),
            repo: repo.name().to_owned(),
            comment_id,
            issue_number,
            installation_id: installation.value(),
        }
    }
}

/// Backoff section of the queue options wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffOptions {
    /// Backoff strategy name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Base delay in milliseconds.
    pub delay: u64,
}

/// Queue options attached to every cleanup job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupJobOptions {
    /// Initial eligibility delay in milliseconds.
    pub delay: u64,
    /// Total execution attempts.
    pub attempts: u32,
    /// Retry backoff configuration.
    pub backoff: BackoffOptions,
}

impl CleanupJobOptions {
    /// Creates the standard cleanup options with the given eligibility delay.
    #[must_use]
    pub fn delayed(delay: Duration) -> Self {
        Self {
            delay: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempts: CLEANUP_MAX_ATTEMPTS,
            backoff: BackoffOptions {
                kind: "exponential".to_owned(),
                delay: u64::try_from(CLEANUP_BACKOFF_BASE.as_millis()).unwrap_or(u64::MAX),
            },
        }
    }
}

/// Verdict for one failed cleanup execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupVerdict {
    /// Run again after the given backoff delay.
    Retrying {
        /// Delay before the job becomes eligible again.
        delay: Duration,
    },
    /// Terminal; the job is discarded and never run again.
    Failed,
}

/// Retry ceiling and doubling backoff for cleanup executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given ceiling and base delay.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Returns the standard cleanup policy.
    #[must_use]
    pub const fn cleanup() -> Self {
        Self::new(CLEANUP_MAX_ATTEMPTS, CLEANUP_BACKOFF_BASE)
    }

    /// Returns the backoff delay after the given number of failed attempts,
    /// doubling per attempt.
    #[must_use]
    pub fn backoff_delay(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }

    /// Evaluates one failed execution into a retry or terminal verdict.
    #[must_use]
    pub fn evaluate(&self, attempts_made: u32) -> CleanupVerdict {
        if attempts_made >= self.max_attempts {
            return CleanupVerdict::Failed;
        }

        CleanupVerdict::Retrying {
            delay: self.backoff_delay(attempts_made),
        }
    }
}
