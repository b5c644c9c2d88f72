use std::sync::Arc;
use std::time::Duration;

use reposignal_core::AppResult;
use reposignal_domain::{AuditEntry, CleanupJob, CleanupVerdict, RepoRef, RetryPolicy};
use tracing::{debug, warn};

use crate::ports::{BackendClient, ClaimedCleanupJob, CleanupQueue, GithubClient};

#[cfg(test)]
mod tests;

/// Outcome of one cleanup job execution, consumed by the supervising claim
/// loop which owns the retry/backoff decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The target message was deleted; the job is discarded.
    Completed,
    /// Deletion failed below the retry ceiling; the job becomes eligible
    /// again after the given backoff delay.
    Retrying {
        /// Backoff delay before the next attempt.
        delay: Duration,
    },
    /// Deletion failed at the retry ceiling; terminal, never run again.
    Failed,
}

/// Executes claimed cleanup jobs against the platform API.
#[derive(Clone)]
pub struct CleanupService {
    github: Arc<dyn GithubClient>,
    backend: Arc<dyn BackendClient>,
    queue: Arc<dyn CleanupQueue>,
    policy: RetryPolicy,
}

impl CleanupService {
    /// Creates a cleanup service with the standard retry policy.
    #[must_use]
    pub fn new(
        github: Arc<dyn GithubClient>,
        backend: Arc<dyn BackendClient>,
        queue: Arc<dyn CleanupQueue>,
    ) -> Self {
        Self {
            github,
            backend,
            queue,
            policy: RetryPolicy::cleanup(),
        }
    }

    /// Claims and processes one due job. Returns false when the queue has
    /// nothing due, so callers can sleep before polling again.
    pub async fn process_next(&self) -> AppResult<bool> {
        let Some(claimed) = self.queue.claim_due().await? else {
            return Ok(false);
        };

        match self.execute(&claimed).await {
            CleanupOutcome::Completed => self.queue.complete(&claimed).await?,
            CleanupOutcome::Retrying { delay } => self.queue.retry(&claimed, delay).await?,
            CleanupOutcome::Failed => {
                warn!(
                    job_id = %claimed.job_id,
                    comment_id = claimed.job.comment_id,
                    "cleanup job exhausted its retries"
                );
                self.queue.discard(&claimed).await?;
            }
        }

        Ok(true)
    }

    /// Executes one claimed job and returns the explicit outcome.
    pub async fn execute(&self, claimed: &ClaimedCleanupJob) -> CleanupOutcome {
        match self.delete_target(&claimed.job).await {
            Ok(()) => {
                debug!(
                    job_id = %claimed.job_id,
                    comment_id = claimed.job.comment_id,
                    "removed ephemeral comment"
                );
                self.record_removal(&claimed.job).await;
                CleanupOutcome::Completed
            }
            Err(error) => {
                let attempts_made = claimed.attempts_made.saturating_add(1);
                warn!(
                    error = %error,
                    job_id = %claimed.job_id,
                    comment_id = claimed.job.comment_id,
                    attempts_made,
                    "comment deletion failed"
                );
                match self.policy.evaluate(attempts_made) {
                    CleanupVerdict::Retrying { delay } => CleanupOutcome::Retrying { delay },
                    CleanupVerdict::Failed => CleanupOutcome::Failed,
                }
            }
        }
    }

    async fn delete_target(&self, job: &CleanupJob) -> AppResult<()> {
        let repo = RepoRef::new(job.owner.as_str(), job.repo.as_str())?;
        self.github.delete_comment(&repo, job.comment_id).await
    }

    /// Exhaustion is never audited; only successful removals are.
    async fn record_removal(&self, job: &CleanupJob) {
        let entity = match job.issue_number {
            Some(number) => format!("{}/{}#{number}", job.owner, job.repo),
            None => format!("{}/{}", job.owner, job.repo),
        };
        let entry = AuditEntry::system(
            "comment_removed",
            entity,
            format!("commentId={}", job.comment_id),
        );
        if let Err(error) = self.backend.append_log(entry).await {
            warn!(error = %error, "audit log append failed");
        }
    }
}
