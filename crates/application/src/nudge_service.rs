use std::sync::Arc;

use reposignal_core::AppResult;
use reposignal_domain::{
    CleanupJob, ISSUE_NUDGE_SWEEP_DELAY, InstallationId, MERGE_NUDGE_SWEEP_DELAY, RepoRef,
};

use crate::ports::{CleanupQueue, GithubClient};

/// A newly opened issue that should receive a classification nudge.
#[derive(Debug, Clone)]
pub struct IssueOpened {
    /// Enclosing repository.
    pub repo: RepoRef,
    /// Thread-local issue number.
    pub issue_number: u64,
    /// Installation authorizing API calls for this repository.
    pub installation: InstallationId,
}

/// A freshly merged pull request whose author should receive a feedback
/// nudge.
#[derive(Debug, Clone)]
pub struct PullRequestMerged {
    /// Enclosing repository.
    pub repo: RepoRef,
    /// Thread-local pull request number.
    pub number: u64,
    /// Login of the pull request author.
    pub author_login: String,
    /// Installation authorizing API calls for this repository.
    pub installation: InstallationId,
}

/// Posts ephemeral nudge comments. Every nudge is paired with exactly one
/// cleanup obligation; a failed post schedules nothing.
#[derive(Clone)]
pub struct NudgeService {
    github: Arc<dyn GithubClient>,
    queue: Arc<dyn CleanupQueue>,
}

impl NudgeService {
    /// Creates a nudge service over the injected ports.
    #[must_use]
    pub fn new(github: Arc<dyn GithubClient>, queue: Arc<dyn CleanupQueue>) -> Self {
        Self { github, queue }
    }

    /// Posts the classification nudge on a newly opened issue.
    pub async fn issue_opened(&self, event: IssueOpened) -> AppResult<()> {
        let posted = self
            .github
            .create_comment(&event.repo, event.issue_number, issue_nudge_body())
            .await?;

        let job = CleanupJob::for_comment(
            &event.repo,
            posted.id,
            Some(event.issue_number),
            event.installation,
        );
        self.queue.enqueue(job, ISSUE_NUDGE_SWEEP_DELAY).await
    }

    /// Posts the feedback nudge on a freshly merged pull request.
    pub async fn pull_request_merged(&self, event: PullRequestMerged) -> AppResult<()> {
        let body = merge_nudge_body(event.author_login.as_str());
        let posted = self
            .github
            .create_comment(&event.repo, event.number, &body)
            .await?;

        let job =
            CleanupJob::for_comment(&event.repo, posted.id, Some(event.number), event.installation);
        self.queue.enqueue(job, MERGE_NUDGE_SWEEP_DELAY).await
    }
}

fn issue_nudge_body() -> &'static str {
    "Maintainers: you can classify this issue with `/reposignal difficulty <1-5>`, \
     `/reposignal type <docs|bug|feature|refactor|test|infra>`, or `/reposignal hide`. \
     This comment will remove itself shortly."
}

fn merge_nudge_body(author_login: &str) -> String {
    format!(
        "@{author_login} your pull request was merged. You can rate the experience \
         anonymously with `/reposignal rate difficulty <1-5>` and \
         `/reposignal rate responsiveness <1-5>`. This comment will remove itself shortly."
    )
}
