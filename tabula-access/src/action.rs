//! The enumerated set of gated actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an action is decided against a base or against the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    Platform,
    Base,
}

/// An operation an actor may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "bases:create")]
    BasesCreate,
    #[serde(rename = "platform:users:manage")]
    PlatformUsersManage,
    #[serde(rename = "base:view")]
    BaseView,
    #[serde(rename = "base:delete")]
    BaseDelete,
    #[serde(rename = "base:visibility")]
    BaseVisibility,
    #[serde(rename = "schema:manage")]
    SchemaManage,
    #[serde(rename = "members:manage")]
    MembersManage,
    #[serde(rename = "records:read")]
    RecordsRead,
    #[serde(rename = "records:create")]
    RecordsCreate,
    #[serde(rename = "records:update")]
    RecordsUpdate,
    #[serde(rename = "records:delete")]
    RecordsDelete,
    #[serde(rename = "comments:create")]
    CommentsCreate,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::BasesCreate,
        Action::PlatformUsersManage,
        Action::BaseView,
        Action::BaseDelete,
        Action::BaseVisibility,
        Action::SchemaManage,
        Action::MembersManage,
        Action::RecordsRead,
        Action::RecordsCreate,
        Action::RecordsUpdate,
        Action::RecordsDelete,
        Action::CommentsCreate,
    ];

    /// Wire name, e.g. `records:update`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasesCreate => "bases:create",
            Self::PlatformUsersManage => "platform:users:manage",
            Self::BaseView => "base:view",
            Self::BaseDelete => "base:delete",
            Self::BaseVisibility => "base:visibility",
            Self::SchemaManage => "schema:manage",
            Self::MembersManage => "members:manage",
            Self::RecordsRead => "records:read",
            Self::RecordsCreate => "records:create",
            Self::RecordsUpdate => "records:update",
            Self::RecordsDelete => "records:delete",
            Self::CommentsCreate => "comments:create",
        }
    }

    /// Looks an action up by wire name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    pub fn scope(&self) -> ActionScope {
        match self {
            Self::BasesCreate | Self::PlatformUsersManage => ActionScope::Platform,
            _ => ActionScope::Base,
        }
    }

    /// Administrative actions granted to the base owner outright and never
    /// to delegated members.
    pub fn is_owner_administrative(&self) -> bool {
        matches!(
            self,
            Self::SchemaManage | Self::MembersManage | Self::BaseDelete | Self::BaseVisibility
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_back_to_actions() {
        for action in Action::ALL {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Action::parse("records:archive"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn only_two_platform_actions() {
        let platform: Vec<_> = Action::ALL
            .into_iter()
            .filter(|a| a.scope() == ActionScope::Platform)
            .collect();
        assert_eq!(platform, vec![Action::BasesCreate, Action::PlatformUsersManage]);
    }
}
