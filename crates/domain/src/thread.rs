use std::fmt::{Display, Formatter};

use reposignal_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Validated repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    owner: NonEmptyString,
    name: NonEmptyString,
}

impl RepoRef {
    /// Creates a validated repository reference.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            owner: NonEmptyString::new(owner)?,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the repository owner login.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    /// Returns the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl Display for RepoRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.owner.as_str(), self.name.as_str())
    }
}

/// Kind of the enclosing comment thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadKind {
    /// A plain issue thread.
    Issue,
    /// A pull request thread.
    PullRequest,
}

/// Descriptor of the thread an event arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadRef {
    /// Enclosing repository.
    pub repo: RepoRef,
    /// Thread-local entity number.
    pub number: u64,
    /// Whether the thread is an issue or a pull request.
    pub kind: ThreadKind,
}

impl ThreadRef {
    /// Returns true when the thread is a pull request.
    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.kind == ThreadKind::PullRequest
    }
}

/// Pull request facts resolved for contributor validation. The `id` is the
/// platform-assigned identifier used as the feedback correlation key; the
/// thread-local `number` is never used for that purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    /// Platform-assigned pull request id.
    pub id: u64,
    /// Thread-local pull request number.
    pub number: u64,
    /// Whether the pull request is merged.
    pub merged: bool,
    /// Login of the pull request author.
    pub author_login: String,
}

/// Platform installation that authorizes API calls for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(u64);

impl InstallationId {
    /// Creates an installation id from the platform value.
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the numeric value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}
