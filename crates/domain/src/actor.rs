use serde::{Deserialize, Serialize};

/// Platform identity observed on an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Platform login name.
    pub login: String,
    /// Platform-assigned numeric id.
    pub id: u64,
}

/// Role attached to audit entries; determines which identity fields may be
/// recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// The process itself, e.g. the cleanup worker.
    System,
    /// An automated platform account.
    Bot,
    /// A repository collaborator with classification rights.
    Maintainer,
    /// A pull request author; always recorded anonymously.
    Contributor,
}

impl ActorRole {
    /// Returns the stable snake_case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Bot => "bot",
            Self::Maintainer => "maintainer",
            Self::Contributor => "contributor",
        }
    }
}

/// Effective repository permission level reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    /// Full administrative access.
    Admin,
    /// Maintain-level access.
    Maintain,
    /// Push access.
    Write,
    /// Triage-only access.
    Triage,
    /// Read-only access.
    Read,
    /// No access, or an unrecognized level.
    None,
}

impl PermissionLevel {
    /// Parses a platform role name; unrecognized names resolve to no access.
    #[must_use]
    pub fn from_role_name(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "maintain" => Self::Maintain,
            "write" | "push" => Self::Write,
            "triage" => Self::Triage,
            "read" | "pull" => Self::Read,
            _ => Self::None,
        }
    }

    /// Returns true when this level may classify issues.
    #[must_use]
    pub fn can_classify(self) -> bool {
        matches!(self, Self::Admin | Self::Maintain | Self::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::{ActorRole, PermissionLevel};

    #[test]
    fn classification_requires_write_or_above() {
        assert!(PermissionLevel::Admin.can_classify());
        assert!(PermissionLevel::Maintain.can_classify());
        assert!(PermissionLevel::Write.can_classify());
        assert!(!PermissionLevel::Triage.can_classify());
        assert!(!PermissionLevel::Read.can_classify());
        assert!(!PermissionLevel::None.can_classify());
    }

    #[test]
    fn unknown_role_names_resolve_to_no_access() {
        assert_eq!(PermissionLevel::from_role_name("owner"), PermissionLevel::None);
        assert_eq!(PermissionLevel::from_role_name(""), PermissionLevel::None);
        assert_eq!(
            PermissionLevel::from_role_name(" Maintain "),
            PermissionLevel::Maintain
        );
    }

    #[test]
    fn actor_role_wire_names_are_stable() {
        assert_eq!(ActorRole::System.as_str(), "system");
        assert_eq!(ActorRole::Contributor.as_str(), "contributor");
    }
}
