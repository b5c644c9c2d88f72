//! HTTP adapter for the collaboration platform API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use reposignal_application::{GithubClient, PostedComment};
use reposignal_core::{AppError, AppResult};
use reposignal_domain::{PermissionLevel, PullRequestSnapshot, RepoRef};

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    permission: Option<String>,
    role_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    id: u64,
    number: u64,
    #[serde(default)]
    merged: bool,
    user: Option<UserResponse>,
}

#[derive(Debug, Deserialize)]
struct CommentCreateResponse {
    id: u64,
}

/// Reqwest implementation of the platform API port.
#[derive(Clone)]
pub struct HttpGithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl HttpGithubClient {
    /// Creates a client authenticated with the given token.
    pub fn new(api_base: impl Into<String>, token: &str, timeout: Duration) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("reposignal"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        let auth_header = format!("Bearer {}", token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_header).map_err(|error| {
                AppError::Validation(format!("invalid github authorization header: {error}"))
            })?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build github http client: {error}"))
            })?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        })
    }

    async fn decode<T: DeserializeOwned>(
        context: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        Self::check_status(context, &response)?;
        response.json().await.map_err(|error| {
            AppError::Internal(format!("github {context} returned invalid JSON: {error}"))
        })
    }

    fn check_status(context: &str, response: &reqwest::Response) -> AppResult<()> {
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!(
                "github {context} target does not exist"
            ))),
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized(format!(
                "github {context} rejected the credential"
            ))),
            StatusCode::FORBIDDEN => Err(AppError::Forbidden(format!(
                "github {context} is not permitted"
            ))),
            status if status.is_success() => Ok(()),
            status => Err(AppError::Internal(format!(
                "github {context} failed with status {status}"
            ))),
        }
    }
}

#[async_trait]
impl GithubClient for HttpGithubClient {
    async fn permission_level(&self, repo: &RepoRef, login: &str) -> AppResult<PermissionLevel> {
        let url = format!(
            "{}/repos/{}/{}/collaborators/{login}/permission",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        let response = self.http.get(url).send().await.map_err(|error| {
            AppError::Internal(format!("github permission lookup request failed: {error}"))
        })?;
        let permission: PermissionResponse = Self::decode("permission lookup", response).await?;

        // role_name carries finer levels (maintain, triage) than the legacy
        // permission field.
        let level = permission
            .role_name
            .or(permission.permission)
            .unwrap_or_default();
        Ok(PermissionLevel::from_role_name(level.as_str()))
    }

    async fn pull_request(&self, repo: &RepoRef, number: u64) -> AppResult<PullRequestSnapshot> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{number}",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        let response = self.http.get(url).send().await.map_err(|error| {
            AppError::Internal(format!("github pull request fetch request failed: {error}"))
        })?;
        let pull: PullResponse = Self::decode("pull request fetch", response).await?;

        Ok(PullRequestSnapshot {
            id: pull.id,
            number: pull.number,
            merged: pull.merged,
            author_login: pull.user.map(|user| user.login).unwrap_or_default(),
        })
    }

    async fn create_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> AppResult<PostedComment> {
        let url = format!(
            "{}/repos/{}/{}/issues/{number}/comments",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        let response = self
            .http
            .post(url)
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("github comment create request failed: {error}"))
            })?;
        let comment: CommentCreateResponse = Self::decode("comment create", response).await?;

        Ok(PostedComment { id: comment.id })
    }

    async fn delete_comment(&self, repo: &RepoRef, comment_id: u64) -> AppResult<()> {
        let url = format!(
            "{}/repos/{}/{}/issues/comments/{comment_id}",
            self.api_base,
            repo.owner(),
            repo.name()
        );
        let response = self.http.delete(url).send().await.map_err(|error| {
            AppError::Internal(format!("github comment delete request failed: {error}"))
        })?;

        Self::check_status("comment delete", &response)
    }
}
