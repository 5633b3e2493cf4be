//! Soft-deletable entity kinds and their cascade relationships.
//!
//! The trash engine never hard-codes "deleting a workspace also trashes its
//! bases". It walks [`EntityKind::cascade_children`] instead, so a new child
//! kind only needs an edge here.

use crate::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Workspace,
    Base,
    Table,
    Field,
    SelectOption,
    Record,
    Comment,
}

/// A parent → child relationship followed by soft-delete and restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeEdge {
    pub child: EntityKind,
    /// Column on the child that points at the parent.
    pub foreign_key: &'static str,
}

/// How sibling names are kept unique among active rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRule {
    /// The kind has no name.
    Unnamed,
    /// Unique among active siblings, ignoring ASCII case.
    CaseInsensitive,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Workspace,
        EntityKind::Base,
        EntityKind::Table,
        EntityKind::Field,
        EntityKind::SelectOption,
        EntityKind::Record,
        EntityKind::Comment,
    ];

    /// Descendants before ancestors, the order independent purges must run in.
    pub const PURGE_ORDER: [EntityKind; 7] = [
        EntityKind::Comment,
        EntityKind::Record,
        EntityKind::SelectOption,
        EntityKind::Field,
        EntityKind::Table,
        EntityKind::Base,
        EntityKind::Workspace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Base => "base",
            Self::Table => "table",
            Self::Field => "field",
            Self::SelectOption => "option",
            Self::Record => "record",
            Self::Comment => "comment",
        }
    }

    /// The kind this one is nested in, if any.
    pub fn parent(&self) -> Option<EntityKind> {
        match self {
            Self::Workspace => None,
            Self::Base => Some(Self::Workspace),
            Self::Table => Some(Self::Base),
            Self::Field | Self::Record => Some(Self::Table),
            Self::SelectOption => Some(Self::Field),
            Self::Comment => Some(Self::Record),
        }
    }

    /// Children that are trashed and restored together with this kind.
    ///
    /// Tables deliberately do not cascade: their fields and records stay as
    /// they are and are unreachable while the table is trashed.
    pub fn cascade_children(&self) -> &'static [CascadeEdge] {
        const WORKSPACE: &[CascadeEdge] = &[CascadeEdge {
            child: EntityKind::Base,
            foreign_key: "workspace_id",
        }];
        const BASE: &[CascadeEdge] = &[CascadeEdge {
            child: EntityKind::Table,
            foreign_key: "base_id",
        }];
        const FIELD: &[CascadeEdge] = &[CascadeEdge {
            child: EntityKind::SelectOption,
            foreign_key: "field_id",
        }];
        match self {
            Self::Workspace => WORKSPACE,
            Self::Base => BASE,
            Self::Field => FIELD,
            Self::Table | Self::SelectOption | Self::Record | Self::Comment => &[],
        }
    }

    pub fn name_rule(&self) -> NameRule {
        match self {
            Self::Workspace | Self::Base | Self::Table | Self::Field | Self::SelectOption => {
                NameRule::CaseInsensitive
            }
            Self::Record | Self::Comment => NameRule::Unnamed,
        }
    }

    /// Whether active siblings keep a dense 1..N `position`.
    pub fn is_positioned(&self) -> bool {
        matches!(self, Self::Table | Self::Field | Self::SelectOption)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "select_option" => Ok(Self::SelectOption),
            other => Self::ALL
                .into_iter()
                .find(|k| k.as_str() == other)
                .ok_or_else(|| ParseEnumError::new("entity kind", s)),
        }
    }
}
