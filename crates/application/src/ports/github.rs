use async_trait::async_trait;
use reposignal_core::AppResult;
use reposignal_domain::{PermissionLevel, PullRequestSnapshot, RepoRef};

/// Comment created through the platform API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedComment {
    /// Platform-assigned comment id.
    pub id: u64,
}

/// Port for the collaboration platform API.
#[async_trait]
pub trait GithubClient: Send + Sync {
    /// Resolves one actor's effective permission level on a repository.
    async fn permission_level(&self, repo: &RepoRef, login: &str) -> AppResult<PermissionLevel>;

    /// Fetches one pull request by thread number.
    async fn pull_request(&self, repo: &RepoRef, number: u64) -> AppResult<PullRequestSnapshot>;

    /// Posts one comment on an issue or pull request thread.
    async fn create_comment(
        &self,
        repo: &RepoRef,
        number: u64,
        body: &str,
    ) -> AppResult<PostedComment>;

    /// Deletes one comment by id.
    async fn delete_comment(&self, repo: &RepoRef, comment_id: u64) -> AppResult<()>;
}
