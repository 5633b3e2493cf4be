use crate::schema::{BaseRole, FieldType, PlatformRole, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabula_types::{
    BaseId, CommentId, FieldId, OptionId, RecordId, TableId, UserId, WorkspaceId,
};

/// Soft-delete state carried by every trashable entity.
///
/// Persisted as the `is_trashed` / `trashed_at` column pair; keeping a single
/// optional timestamp here makes `is_trashed == trashed_at.is_some()` hold by
/// construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashState {
    trashed_at: Option<DateTime<Utc>>,
}

impl TrashState {
    /// An active (not trashed) entity.
    pub const ACTIVE: TrashState = TrashState { trashed_at: None };

    /// Trashed at the given instant.
    pub fn trashed(at: DateTime<Utc>) -> Self {
        Self {
            trashed_at: Some(at),
        }
    }

    pub fn is_trashed(&self) -> bool {
        self.trashed_at.is_some()
    }

    pub fn trashed_at(&self) -> Option<DateTime<Utc>> {
        self.trashed_at
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub platform_role: PlatformRole,
    pub can_create_bases: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub owner_id: UserId,
    pub name: String,
    pub trash: TrashState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub id: BaseId,
    pub owner_id: UserId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub visibility: Visibility,
    pub trash: TrashState,
    pub created_at: DateTime<Utc>,
}

/// Delegated access of a non-owner to a base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMember {
    pub base_id: BaseId,
    pub user_id: UserId,
    pub role: BaseRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub id: TableId,
    pub base_id: BaseId,
    pub name: String,
    /// 1-based, dense among the active tables of the base.
    pub position: i64,
    pub trash: TrashState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub table_id: TableId,
    pub name: String,
    pub field_type: FieldType,
    pub position: i64,
    pub trash: TrashState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: OptionId,
    pub field_id: FieldId,
    pub label: String,
    pub color: Option<String>,
    pub position: i64,
    pub trash: TrashState,
}

/// A row of a table. Its values live in [`RecordCell`](crate::RecordCell)s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub id: RecordId,
    pub table_id: TableId,
    pub created_by: Option<UserId>,
    pub trash: TrashState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub record_id: RecordId,
    pub author_id: UserId,
    pub body: String,
    pub trash: TrashState,
    pub created_at: DateTime<Utc>,
}
