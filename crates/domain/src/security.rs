use std::str::FromStr;

use quire_core::AppError;
use serde::{Deserialize, Serialize};

/// Permissions enforced by resource policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows listing and reading records.
    RecordRead,
    /// Allows creating, updating and deleting records.
    RecordWrite,
    /// Lifts owner scoping so every record of a type is visible.
    RecordScopeAll,
    /// Allows reading audit log entries.
    AuditRead,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordRead => "record.read",
            Self::RecordWrite => "record.write",
            Self::RecordScopeAll => "record.scope.all",
            Self::AuditRead => "audit.read",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::RecordRead,
            Permission::RecordWrite,
            Permission::RecordScopeAll,
            Permission::AuditRead,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "record.read" => Ok(Self::RecordRead),
            "record.write" => Ok(Self::RecordWrite),
            "record.scope.all" => Ok(Self::RecordScopeAll),
            "audit.read" => Ok(Self::AuditRead),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Action an actor attempts on a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    /// Listing records.
    List,
    /// Reading one record.
    Read,
    /// Creating a record.
    Create,
    /// Updating a record.
    Update,
    /// Deleting a record.
    Delete,
}

impl ResourceAction {
    /// Returns the stable action label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Returns whether the action mutates state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

/// Well-known event names broadcast by the framework.
///
/// Record events are published by the record command service. The user and
/// application events are reserved for the authentication and error-reporting
/// collaborators that sit outside this workspace and publish through the same bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkEvent {
    /// A record was created.
    RecordCreated,
    /// A record was updated.
    RecordUpdated,
    /// A record was deleted.
    RecordDeleted,
    /// A user signed in.
    UserLogin,
    /// A user signed out.
    UserLogout,
    /// A user registered.
    UserRegister,
    /// Request handling failed unexpectedly.
    ApplicationError,
}

impl FrameworkEvent {
    /// Returns the stable event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordCreated => "record.created",
            Self::RecordUpdated => "record.updated",
            Self::RecordDeleted => "record.deleted",
            Self::UserLogin => "user.login",
            Self::UserLogout => "user.logout",
            Self::UserRegister => "user.register",
            Self::ApplicationError => "application.error",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Permission, ResourceAction};

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            let restored = Permission::from_str(permission.as_str());
            assert_eq!(restored.ok(), Some(*permission));
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        let parsed = Permission::from_str("record.unknown");
        assert!(parsed.is_err());
    }

    #[test]
    fn only_writes_are_mutations() {
        assert!(!ResourceAction::List.is_mutation());
        assert!(!ResourceAction::Read.is_mutation());
        assert!(ResourceAction::Delete.is_mutation());
    }
}
