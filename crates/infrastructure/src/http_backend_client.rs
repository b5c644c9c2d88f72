//! HTTP adapter for the state-owning backend service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;

use reposignal_application::{BackendClient, ClassifyIssueRequest, FeedbackSubmission};
use reposignal_core::{AppError, AppResult};
use reposignal_domain::{AuditEntry, Difficulty, Rating};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorPayload<'a> {
    login: &'a str,
    id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyIssuePayload<'a> {
    owner: &'a str,
    repo: &'a str,
    issue_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hidden: Option<bool>,
    actor: ActorPayload<'a>,
}

// Rating fields serialize as explicit nulls; the backend treats null and
// absent differently for partial submissions. No actor identity field
// exists on this payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackPayload<'a> {
    pull_request_id: u64,
    owner: &'a str,
    repo: &'a str,
    difficulty_rating: Option<u8>,
    responsiveness_rating: Option<u8>,
}

/// Reqwest implementation of the backend service port.
#[derive(Clone)]
pub struct HttpBackendClient {
    http: reqwest::Client,
    api_base: String,
}

impl HttpBackendClient {
    /// Creates a client authenticated with the given bearer credential. The
    /// credential is attached to every request and never logged.
    pub fn new(api_base: impl Into<String>, token: &str, timeout: Duration) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        let auth_header = format!("Bearer {}", token.trim());
        let mut auth_value = HeaderValue::from_str(&auth_header).map_err(|error| {
            AppError::Validation(format!("invalid backend authorization header: {error}"))
        })?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build backend http client: {error}"))
            })?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        })
    }

    async fn post_json<T: Serialize>(&self, context: &str, path: &str, body: &T) -> AppResult<()> {
        let url = format!("{}{path}", self.api_base);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("backend {context} request failed: {error}"))
            })?;

        let status = response.status();
        match status {
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(format!(
                "backend {context} rejected the credential"
            ))),
            StatusCode::FORBIDDEN => Err(AppError::Forbidden(format!(
                "backend {context} is not permitted"
            ))),
            status if status.is_success() => Ok(()),
            status => Err(AppError::Internal(format!(
                "backend {context} failed with status {status}"
            ))),
        }
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn classify_issue(&self, request: ClassifyIssueRequest) -> AppResult<()> {
        let payload = ClassifyIssuePayload {
            owner: request.repo.owner(),
            repo: request.repo.name(),
            issue_number: request.issue_number,
            difficulty: request.classification.difficulty.map(Difficulty::value),
            issue_type: request
                .classification
                .issue_type
                .map(|issue_type| issue_type.as_str()),
            hidden: request.classification.hidden,
            actor: ActorPayload {
                login: request.actor.login.as_str(),
                id: request.actor.id,
            },
        };

        self.post_json("issue classification", "/api/issues/classify", &payload)
            .await
    }

    async fn submit_feedback(&self, submission: FeedbackSubmission) -> AppResult<()> {
        let payload = FeedbackPayload {
            pull_request_id: submission.pull_request_id,
            owner: submission.repo.owner(),
            repo: submission.repo.name(),
            difficulty_rating: submission.difficulty_rating.map(Rating::value),
            responsiveness_rating: submission.responsiveness_rating.map(Rating::value),
        };

        self.post_json("feedback submission", "/api/feedback", &payload)
            .await
    }

    async fn append_log(&self, entry: AuditEntry) -> AppResult<()> {
        self.post_json("audit log append", "/api/audit-log", &entry)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::FeedbackPayload;

    #[test]
    fn feedback_payload_serializes_missing_ratings_as_null() {
        let payload = FeedbackPayload {
            pull_request_id: 5_511,
            owner: "acme",
            repo: "widgets",
            difficulty_rating: Some(4),
            responsiveness_rating: None,
        };
        let serialized = serde_json::to_string(&payload).ok();
        assert_eq!(
            serialized.as_deref(),
            Some(
                r#"{"pullRequestId":5511,"owner":"acme","repo":"widgets","difficultyRating":4,"responsivenessRating":null}"#
            )
        );
    }
}
