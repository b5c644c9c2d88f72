use std::time::Duration;

use async_trait::async_trait;
use reposignal_core::AppResult;
use reposignal_domain::CleanupJob;

/// One job claimed for execution by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedCleanupJob {
    /// Queue-assigned job id.
    pub job_id: String,
    /// The cleanup obligation.
    pub job: CleanupJob,
    /// Executions completed before this claim.
    pub attempts_made: u32,
}

/// Port for the durable cleanup queue.
///
/// Scheduling never blocks the caller on execution; it only guarantees
/// future eligibility. Jobs are uncorrelated and cannot be canceled.
#[async_trait]
pub trait CleanupQueue: Send + Sync {
    /// Durably records that `job` becomes eligible no earlier than
    /// `now + delay`.
    async fn enqueue(&self, job: CleanupJob, delay: Duration) -> AppResult<()>;

    /// Atomically claims one due job; no two callers receive the same job.
    async fn claim_due(&self) -> AppResult<Option<ClaimedCleanupJob>>;

    /// Removes one successfully executed job.
    async fn complete(&self, claimed: &ClaimedCleanupJob) -> AppResult<()>;

    /// Re-schedules one failed job after the given backoff delay.
    async fn retry(&self, claimed: &ClaimedCleanupJob, delay: Duration) -> AppResult<()>;

    /// Drops one terminally failed job.
    async fn discard(&self, claimed: &ClaimedCleanupJob) -> AppResult<()>;
}
