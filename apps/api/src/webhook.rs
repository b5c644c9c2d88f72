use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use reposignal_application::{CommentEvent, IssueOpened, PullRequestMerged};
use reposignal_core::{AppError, AppResult};
use reposignal_domain::{Actor, InstallationId, RepoRef, ThreadKind, ThreadRef};

use crate::state::AppState;

/// Webhook event kinds this receiver dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    CommentCreated,
    IssueOpened,
    PullRequestClosed,
}

/// Explicit event table: every handled (event, action) pair in one place,
/// walked by a single dispatch function. Unmapped deliveries are
/// acknowledged and dropped.
const EVENT_ROUTES: &[(&str, &str, EventKind)] = &[
    ("issue_comment", "created", EventKind::CommentCreated),
    ("issues", "opened", EventKind::IssueOpened),
    ("pull_request", "closed", EventKind::PullRequestClosed),
];

fn route_event(event: &str, action: &str) -> Option<EventKind> {
    EVENT_ROUTES
        .iter()
        .find(|(mapped_event, mapped_action, _)| {
            *mapped_event == event && *mapped_action == action
        })
        .map(|(_, _, kind)| *kind)
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
struct InstallationPayload {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    login: String,
    id: u64,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    number: u64,
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    id: u64,
    #[serde(default)]
    body: String,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    #[serde(default)]
    merged: bool,
    user: Option<UserPayload>,
}

/// Inbound webhook delivery body.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    action: String,
    repository: Option<RepositoryPayload>,
    installation: Option<InstallationPayload>,
    issue: Option<IssuePayload>,
    comment: Option<CommentPayload>,
    pull_request: Option<PullRequestPayload>,
}

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Reports process liveness.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Receives one webhook delivery. Every delivery is acknowledged; handler
/// failures are logged operationally and never surfaced to the platform or
/// into the thread.
pub async fn github_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> StatusCode {
    let event = headers
        .get("x-github-event")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();

    let Some(kind) = route_event(event.as_str(), payload.action.as_str()) else {
        return StatusCode::NO_CONTENT;
    };

    if let Err(error) = dispatch(&state, kind, payload).await {
        warn!(error = %error, event = %event, "webhook handling failed");
    }

    StatusCode::NO_CONTENT
}

async fn dispatch(state: &AppState, kind: EventKind, payload: WebhookPayload) -> AppResult<()> {
    match kind {
        EventKind::CommentCreated => handle_comment_created(state, payload).await,
        EventKind::IssueOpened => handle_issue_opened(state, payload).await,
        EventKind::PullRequestClosed => handle_pull_request_closed(state, payload).await,
    }
}

async fn handle_comment_created(state: &AppState, payload: WebhookPayload) -> AppResult<()> {
    let repo = parse_repo(payload.repository.as_ref())?;
    let installation = parse_installation(payload.installation.as_ref())?;
    let issue = payload
        .issue
        .as_ref()
        .ok_or_else(|| AppError::Validation("webhook payload missing issue".to_owned()))?;
    let comment = payload
        .comment
        .ok_or_else(|| AppError::Validation("webhook payload missing comment".to_owned()))?;

    // Bot-authored comments (our own confirmations and nudges included)
    // never parse as commands.
    if comment.user.kind.eq_ignore_ascii_case("bot") {
        return Ok(());
    }

    let kind = if issue.pull_request.is_some() {
        ThreadKind::PullRequest
    } else {
        ThreadKind::Issue
    };

    state
        .command_service
        .handle_comment(CommentEvent {
            thread: ThreadRef {
                repo,
                number: issue.number,
                kind,
            },
            comment_id: comment.id,
            body: comment.body,
            actor: Actor {
                login: comment.user.login,
                id: comment.user.id,
            },
            installation,
        })
        .await
}

async fn handle_issue_opened(state: &AppState, payload: WebhookPayload) -> AppResult<()> {
    let repo = parse_repo(payload.repository.as_ref())?;
    let installation = parse_installation(payload.installation.as_ref())?;
    let issue = payload
        .issue
        .as_ref()
        .ok_or_else(|| AppError::Validation("webhook payload missing issue".to_owned()))?;

    state
        .nudge_service
        .issue_opened(IssueOpened {
            repo,
            issue_number: issue.number,
            installation,
        })
        .await
}

async fn handle_pull_request_closed(state: &AppState, payload: WebhookPayload) -> AppResult<()> {
    let repo = parse_repo(payload.repository.as_ref())?;
    let installation = parse_installation(payload.installation.as_ref())?;
    let pull = payload
        .pull_request
        .ok_or_else(|| AppError::Validation("webhook payload missing pull_request".to_owned()))?;

    // Closed-without-merge carries no feedback opportunity.
    if !pull.merged {
        return Ok(());
    }

    let author_login = pull
        .user
        .map(|user| user.login)
        .ok_or_else(|| AppError::Validation("webhook payload missing pull_request user".to_owned()))?;

    state
        .nudge_service
        .pull_request_merged(PullRequestMerged {
            repo,
            number: pull.number,
            author_login,
            installation,
        })
        .await
}

fn parse_repo(repository: Option<&RepositoryPayload>) -> AppResult<RepoRef> {
    let repository = repository
        .ok_or_else(|| AppError::Validation("webhook payload missing repository".to_owned()))?;
    RepoRef::new(repository.owner.login.as_str(), repository.name.as_str())
}

fn parse_installation(installation: Option<&InstallationPayload>) -> AppResult<InstallationId> {
    let installation = installation
        .ok_or_else(|| AppError::Validation("webhook payload missing installation".to_owned()))?;
    Ok(InstallationId::new(installation.id))
}
