use std::sync::Arc;

use reposignal_core::AppResult;
use reposignal_domain::{
    Actor, AuditEntry, ClassificationBatch, CleanupJob, CommandBatch, EXCHANGE_SWEEP_DELAY,
    InstallationId, PullRequestSnapshot, RateCommand, ThreadRef,
};
use tracing::warn;

use crate::ports::{
    BackendClient, ClassifyIssueRequest, CleanupQueue, FeedbackSubmission, GithubClient,
    IssueClassification, PostedComment,
};


/// Inbound comment event, built fresh per webhook delivery.
#[derive(Debug, Clone)]
pub struct CommentEvent {
    /// Thread the comment arrived on.
    pub thread: ThreadRef,
    /// Id of the triggering comment.
    pub comment_id: u64,
    /// Raw comment body.
    pub body: String,
    /// Comment author.
    pub actor: Actor,
    /// Installation authorizing API calls for this repository.
    pub installation: InstallationId,
}

/// Validation outcome. A deny produces zero observable output: no comment,
/// no audit entry, and no narration of which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<T> {
    /// The command may execute against the bound entity.
    Allow(T),
    /// The command is dropped silently.
    Deny,
}

/// Validates comment commands per actor role and thread context, then
/// dispatches each allowed batch with strictly ordered side effects:
/// mutating call, confirmation post, cleanup scheduling, audit entry.
#[derive(Clone)]
pub struct CommandService {
    github: Arc<dyn GithubClient>,
    backend: Arc<dyn BackendClient>,
    queue: Arc<dyn CleanupQueue>,
}

impl CommandService {
    /// Creates a command service over the injected ports.
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
        }
    }

    /// Handles one inbound comment. Text without the trigger token, and any
    /// denied command, produces no external call and no message.
    pub async fn handle_comment(&self, event: CommentEvent) -> AppResult<()> {
        let batch = CommandBatch::parse(event.body.as_str());
        if batch.is_empty() {
            return Ok(());
        }

        // The triggering comment gets exactly one cleanup job no matter how
        // many exchanges this comment produces.
        let mut trigger_swept = false;

        if let Some(classification) = batch.classification() {
            self.dispatch_classification(&event, classification, &mut trigger_swept)
                .await?;
        }

        if !batch.ratings().is_empty() {
            self.dispatch_ratings(&event, batch.ratings(), &mut trigger_swept)
                .await?;
        }

        Ok(())
    }

    /// Maintainer policy: one permission lookup, fail-closed.
    async fn authorize_maintainer(&self, event: &CommentEvent) -> Decision<()> {
        match self
            .github
            .permission_level(&event.thread.repo, event.actor.login.as_str())
            .await
        {
            Ok(level) if level.can_classify() => Decision::Allow(()),
            Ok(_) => Decision::Deny,
            Err(error) => {
                warn!(
                    error = %error,
                    repo = %event.thread.repo,
                    "permission lookup failed"
                );
                Decision::Deny
            }
        }
    }

    /// Contributor policy: the thread must be a pull request, the pull
    /// request merged, and the actor its author. One fetch resolves all
    /// three; the bound entity is the platform-assigned pull request id.
    async fn authorize_contributor(&self, event: &CommentEvent) -> Decision<PullRequestSnapshot> {
        if !event.thread.is_pull_request() {
            return Decision::Deny;
        }

        let pull = match self
            .github
            .pull_request(&event.thread.repo, event.thread.number)
            .await
        {
            Ok(pull) => pull,
            Err(error) => {
                warn!(
                    error = %error,
                    repo = %event.thread.repo,
                    number = event.thread.number,
                    "pull request fetch failed"
                );
                return Decision::Deny;
            }
        };

        if !pull.merged || pull.author_login != event.actor.login {
            return Decision::Deny;
        }

        Decision::Allow(pull)
    }

    async fn dispatch_classification(
        &self,
        event: &CommentEvent,
        classification: &ClassificationBatch,
        trigger_swept: &mut bool,
    ) -> AppResult<()> {
        let Decision::Allow(()) = self.authorize_maintainer(event).await else {
            return Ok(());
        };

        let request = ClassifyIssueRequest {
            repo: event.thread.repo.clone(),
            issue_number: event.thread.number,
            classification: IssueClassification {
                difficulty: classification.difficulty(),
                issue_type: classification.issue_type(),
                hidden: classification.hide().then_some(true),
            },
            actor: event.actor.clone(),
        };
        self.backend.classify_issue(request).await?;

        let confirmation = render_classification_confirmation(classification);
        let posted = self
            .github
            .create_comment(&event.thread.repo, event.thread.number, &confirmation)
            .await?;
        self.sweep_exchange(event, posted, trigger_swept).await?;

        self.append_audit(AuditEntry::maintainer(
            &event.actor,
            "issue_classified",
            entity_reference(&event.thread),
            classification_context(classification),
        ))
        .await;

        Ok(())
    }

    async fn dispatch_ratings(
        &self,
        event: &CommentEvent,
        ratings: &[RateCommand],
        trigger_swept: &mut bool,
    ) -> AppResult<()> {
        let Decision::Allow(pull) = self.authorize_contributor(event).await else {
            return Ok(());
        };

        for rating in ratings {
            let submission = match *rating {
                RateCommand::Difficulty(value) => FeedbackSubmission {
                    pull_request_id: pull.id,
                    repo: event.thread.repo.clone(),
                    difficulty_rating: Some(value),
                    responsiveness_rating: None,
                },
                RateCommand::Responsiveness(value) => FeedbackSubmission {
                    pull_request_id: pull.id,
                    repo: event.thread.repo.clone(),
                    difficulty_rating: None,
                    responsiveness_rating: Some(value),
                },
            };
            self.backend.submit_feedback(submission).await?;

            let confirmation = render_feedback_confirmation(*rating);
            let posted = self
                .github
                .create_comment(&event.thread.repo, event.thread.number, confirmation)
                .await?;
            self.sweep_exchange(event, posted, trigger_swept).await?;

            self.append_audit(AuditEntry::contributor(
                "feedback_submitted",
                format!("pr:{}", pull.id),
                feedback_context(*rating),
            ))
            .await;
        }

        Ok(())
    }

    /// Schedules cleanup for one exchange: the triggering comment (once per
    /// inbound comment) plus the freshly posted confirmation.
    async fn sweep_exchange(
        &self,
        event: &CommentEvent,
        posted: PostedComment,
        trigger_swept: &mut bool,
    ) -> AppResult<()> {
        if !*trigger_swept {
            let job = CleanupJob::for_comment(
                &event.thread.repo,
                event.comment_id,
                Some(event.thread.number),
                event.installation,
            );
            self.queue.enqueue(job, EXCHANGE_SWEEP_DELAY).await?;
            *trigger_swept = true;
        }

        let job = CleanupJob::for_comment(
            &event.thread.repo,
            posted.id,
            Some(event.thread.number),
            event.installation,
        );
        self.queue.enqueue(job, EXCHANGE_SWEEP_DELAY).await
    }

    async fn append_audit(&self, entry: AuditEntry) {
        if let Err(error) = self.backend.append_log(entry).await {
            warn!(error = %error, "audit log append failed");
        }
    }
}

fn entity_reference(thread: &ThreadRef) -> String {
    format!("{}#{}", thread.repo, thread.number)
}

fn render_classification_confirmation(classification: &ClassificationBatch) -> String {
    let mut changes = Vec::new();
    if let Some(difficulty) = classification.difficulty() {
        changes.push(format!("difficulty set to {}", difficulty.value()));
    }
    if let Some(issue_type) = classification.issue_type() {
        changes.push(format!("type set to {}", issue_type.as_str()));
    }
    if classification.hide() {
        changes.push("issue hidden".to_owned());
    }

    format!(
        "Recorded: {}. This comment will remove itself shortly.",
        changes.join(", ")
    )
}

fn render_feedback_confirmation(rating: RateCommand) -> &'static str {
    match rating {
        RateCommand::Difficulty(_) => {
            "Thanks! Your difficulty rating was recorded anonymously. This comment will remove itself shortly."
        }
        RateCommand::Responsiveness(_) => {
            "Thanks! Your responsiveness rating was recorded anonymously. This comment will remove itself shortly."
        }
    }
}

fn classification_context(classification: &ClassificationBatch) -> String {
    let mut parts = Vec::new();
    if let Some(difficulty) = classification.difficulty() {
        parts.push(format!("difficulty={}", difficulty.value()));
    }
    if let Some(issue_type) = classification.issue_type() {
        parts.push(format!("type={}", issue_type.as_str()));
    }
    if classification.hide() {
        parts.push("hidden=true".to_owned());
    }

    parts.join(" ")
}

fn feedback_context(rating: RateCommand) -> String {
    match rating {
        RateCommand::Difficulty(value) => format!("difficulty={}", value.value()),
        RateCommand::Responsiveness(value) => format!("responsiveness={}", value.value()),
    }
}
