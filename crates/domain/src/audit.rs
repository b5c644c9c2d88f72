use serde::Serialize;

use crate::actor::{Actor, ActorRole};

/// Write-once audit record handed to the backend log endpoint.
///
/// Identity fields are governed by the role: the contributor constructor
/// takes no identity parameters, so contributor entries are anonymous by
/// construction. Both identity fields serialize as explicit nulls when
/// absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    actor_role: ActorRole,
    actor_login: Option<String>,
    actor_id: Option<u64>,
    action: String,
    entity: String,
    context: String,
}

impl AuditEntry {
    /// Creates a maintainer-role entry carrying the actor's identity.
    #[must_use]
    pub fn maintainer(
        actor: &Actor,
        action: impl Into<String>,
        entity: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            actor_role: ActorRole::Maintainer,
            actor_login: Some(actor.login.clone()),
            actor_id: Some(actor.id),
            action: action.into(),
            entity: entity.into(),
            context: context.into(),
        }
    }

    /// Creates an anonymous contributor-role entry.
    #[must_use]
    pub fn contributor(
        action: impl Into<String>,
        entity: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            actor_role: ActorRole::Contributor,
            actor_login: None,
            actor_id: None,
            action: action.into(),
            entity: entity.into(),
            context: context.into(),
        }
    }

    /// Creates a system-role entry for actions taken by the process itself.
    #[must_use]
    pub fn system(
        action: impl Into<String>,
        entity: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            actor_role: ActorRole::System,
            actor_login: None,
            actor_id: None,
            action: action.into(),
            entity: entity.into(),
            context: context.into(),
        }
    }

    /// Returns the actor role.
    #[must_use]
    pub fn actor_role(&self) -> ActorRole {
        self.actor_role
    }

    /// Returns the recorded actor login, when the role permits one.
    #[must_use]
    pub fn actor_login(&self) -> Option<&str> {
        self.actor_login.as_deref()
    }

    /// Returns the recorded actor id, when the role permits one.
    #[must_use]
    pub fn actor_id(&self) -> Option<u64> {
        self.actor_id
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the entity reference.
    #[must_use]
    pub fn entity(&self) -> &str {
        self.entity.as_str()
    }

    /// Returns the free-form context.
    #[must_use]
    pub fn context(&self) -> &str {
        self.context.as_str()
    }
}
