use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use reposignal_core::{AppError, AppResult};
use reposignal_domain::{
    ActorRole, AuditEntry, CleanupJob, InstallationId, PermissionLevel, PullRequestSnapshot,
    RepoRef,
};

use crate::ports::{
    BackendClient, ClaimedCleanupJob, ClassifyIssueRequest, CleanupQueue, FeedbackSubmission,
    GithubClient, PostedComment,
};

use super::{CleanupOutcome, CleanupService};

struct FakeGithub {
    failures_remaining: AtomicU32,
    deleted: Mutex<Vec<u64>>,
}

impl FakeGithub {
    fn failing(times: u32) -> Self {
        Self {
            failures_remaining: AtomicU32::new(times),
            deleted: Mutex::default(),
        }
    }
}

#[async_trait]
impl GithubClient for FakeGithub {
    async fn permission_level(&self, _repo: &RepoRef, _login: &str) -> AppResult<PermissionLevel> {
        Ok(PermissionLevel::None)
    }

    async fn pull_request(&self, _repo: &RepoRef, _number: u64) -> AppResult<PullRequestSnapshot> {
        Err(AppError::NotFound("not used".to_owned()))
    }

    async fn create_comment(
        &self,
        _repo: &RepoRef,
        _number: u64,
        _body: &str,
    ) -> AppResult<PostedComment> {
        Err(AppError::Internal("not used".to_owned()))
    }

    async fn delete_comment(&self, _repo: &RepoRef, comment_id: u64) -> AppResult<()> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Internal("comment deletion rejected".to_owned()));
        }
        self.deleted.lock().await.push(comment_id);
        Ok(())
    }
}

#[derive(Default)]
struct FakeBackend {
    logs: Mutex<Vec<AuditEntry>>,
}

#[async_trait]
impl BackendClient for FakeBackend {
    async fn classify_issue(&self, _request: ClassifyIssueRequest) -> AppResult<()> {
        Err(AppError::Internal("not used".to_owned()))
    }

    async fn submit_feedback(&self, _submission: FeedbackSubmission) -> AppResult<()> {
        Err(AppError::Internal("not used".to_owned()))
    }

    async fn append_log(&self, entry: AuditEntry) -> AppResult<()> {
        self.logs.lock().await.push(entry);
        Ok(())
    }
}

#[derive(Default)]
struct FakeQueue {
    due: Mutex<Vec<ClaimedCleanupJob>>,
    completed: Mutex<Vec<String>>,
    retried: Mutex<Vec<(String, Duration)>>,
    discarded: Mutex<Vec<String>>,
}

#[async_trait]
impl CleanupQueue for FakeQueue {
    async fn enqueue(&self, _job: CleanupJob, _delay: Duration) -> AppResult<()> {
        Ok(())
    }

    async fn claim_due(&self) -> AppResult<Option<ClaimedCleanupJob>> {
        Ok(self.due.lock().await.pop())
    }

    async fn complete(&self, claimed: &ClaimedCleanupJob) -> AppResult<()> {
        self.completed.lock().await.push(claimed.job_id.clone());
        Ok(())
    }

    async fn retry(&self, claimed: &ClaimedCleanupJob, delay: Duration) -> AppResult<()> {
        self.retried
            .lock()
            .await
            .push((claimed.job_id.clone(), delay));
        Ok(())
    }

    async fn discard(&self, claimed: &ClaimedCleanupJob) -> AppResult<()> {
        self.discarded.lock().await.push(claimed.job_id.clone());
        Ok(())
    }
}

fn claimed(attempts_made: u32) -> ClaimedCleanupJob {
    ClaimedCleanupJob {
        job_id: "31".to_owned(),
        job: CleanupJob {
            owner: "acme".to_owned(),
            repo: "widgets".to_owned(),
            comment_id: 991,
            issue_number: Some(42),
            installation_id: InstallationId::new(77).value(),
        },
        attempts_made,
    }
}

fn service(github: &Arc<FakeGithub>, backend: &Arc<FakeBackend>, queue: &Arc<FakeQueue>) -> CleanupService {
    CleanupService::new(github.clone(), backend.clone(), queue.clone())
}

#[tokio::test]
async fn successful_deletion_completes_and_writes_a_system_entry() {
    let github = Arc::new(FakeGithub::failing(0));
    let backend = Arc::new(FakeBackend::default());
    let queue = Arc::new(FakeQueue::default());

    let outcome = service(&github, &backend, &queue).execute(&claimed(0)).await;
    assert_eq!(outcome, CleanupOutcome::Completed);

    assert_eq!(github.deleted.lock().await.as_slice(), &[991]);
    let logs = backend.logs.lock().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].actor_role(), ActorRole::System);
    assert_eq!(logs[0].action(), "comment_removed");
    assert_eq!(logs[0].entity(), "acme/widgets#42");
}

#[tokio::test]
async fn failures_back_off_doubling_from_five_seconds() {
    let github = Arc::new(FakeGithub::failing(u32::MAX));
    let backend = Arc::new(FakeBackend::default());
    let queue = Arc::new(FakeQueue::default());
    let service = service(&github, &backend, &queue);

    let first = service.execute(&claimed(0)).await;
    assert_eq!(
        first,
        CleanupOutcome::Retrying {
            delay: Duration::from_secs(5)
        }
    );

    let second = service.execute(&claimed(1)).await;
    assert_eq!(
        second,
        CleanupOutcome::Retrying {
            delay: Duration::from_secs(10)
        }
    );
}

#[tokio::test]
async fn third_failure_is_terminal_and_unaudited() {
    let github = Arc::new(FakeGithub::failing(u32::MAX));
    let backend = Arc::new(FakeBackend::default());
    let queue = Arc::new(FakeQueue::default());

    let outcome = service(&github, &backend, &queue).execute(&claimed(2)).await;
    assert_eq!(outcome, CleanupOutcome::Failed);
    assert!(backend.logs.lock().await.is_empty());
}

#[tokio::test]
async fn process_next_applies_outcomes_to_the_queue() {
    let github = Arc::new(FakeGithub::failing(1));
    let backend = Arc::new(FakeBackend::default());
    let queue = Arc::new(FakeQueue::default());
    queue.due.lock().await.push(claimed(0));
    let service = service(&github, &backend, &queue);

    // First claim fails once and is re-scheduled with the base backoff.
    let processed = service.process_next().await;
    assert!(matches!(processed, Ok(true)));
    {
        let retried = queue.retried.lock().await;
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].1, Duration::from_secs(5));
    }

    // Second claim succeeds and completes the job.
    queue.due.lock().await.push(claimed(1));
    let processed = service.process_next().await;
    assert!(matches!(processed, Ok(true)));
    assert_eq!(queue.completed.lock().await.len(), 1);

    // Idle queue reports no work.
    let processed = service.process_next().await;
    assert!(matches!(processed, Ok(false)));
}

#[tokio::test]
async fn exhausted_job_is_discarded_and_never_retried_again() {
    let github = Arc::new(FakeGithub::failing(u32::MAX));
    let backend = Arc::new(FakeBackend::default());
    let queue = Arc::new(FakeQueue::default());
    queue.due.lock().await.push(claimed(2));
    let service = service(&github, &backend, &queue);

    let processed = service.process_next().await;
    assert!(matches!(processed, Ok(true)));
    assert_eq!(queue.discarded.lock().await.len(), 1);
    assert!(queue.retried.lock().await.is_empty());
}

#[tokio::test]
async fn audit_append_failure_does_not_fail_the_job() {
    struct RejectingBackend;

    #[async_trait]
    impl BackendClient for RejectingBackend {
        async fn classify_issue(&self, _request: ClassifyIssueRequest) -> AppResult<()> {
            Err(AppError::Internal("not used".to_owned()))
        }

        async fn submit_feedback(&self, _submission: FeedbackSubmission) -> AppResult<()> {
            Err(AppError::Internal("not used".to_owned()))
        }

        async fn append_log(&self, _entry: AuditEntry) -> AppResult<()> {
            Err(AppError::Internal("audit log unavailable".to_owned()))
        }
    }

    let github = Arc::new(FakeGithub::failing(0));
    let queue = Arc::new(FakeQueue::default());
    let service = CleanupService::new(github, Arc::new(RejectingBackend), queue);

    let outcome = service.execute(&claimed(0)).await;
    assert_eq!(outcome, CleanupOutcome::Completed);
}
