use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabula_types::{AuditEventId, BaseId, FieldId, RecordId, TableId, UserId};

/// What happened, as recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserUpdated,
    WorkspaceCreated,
    WorkspaceRenamed,
    BaseCreated,
    BaseRenamed,
    BaseVisibilityChanged,
    MemberAdded,
    MemberRoleChanged,
    MemberRemoved,
    TableCreated,
    TableRenamed,
    TablesReordered,
    FieldCreated,
    FieldRenamed,
    FieldTypeChanged,
    FieldsReordered,
    OptionCreated,
    OptionUpdated,
    RecordCreated,
    CellUpdated,
    CommentCreated,
    Trashed,
    Restored,
    DeletedPermanently,
    TrashEmptied,
}

impl AuditAction {
    pub const ALL: [AuditAction; 25] = [
        AuditAction::UserUpdated,
        AuditAction::WorkspaceCreated,
        AuditAction::WorkspaceRenamed,
        AuditAction::BaseCreated,
        AuditAction::BaseRenamed,
        AuditAction::BaseVisibilityChanged,
        AuditAction::MemberAdded,
        AuditAction::MemberRoleChanged,
        AuditAction::MemberRemoved,
        AuditAction::TableCreated,
        AuditAction::TableRenamed,
        AuditAction::TablesReordered,
        AuditAction::FieldCreated,
        AuditAction::FieldRenamed,
        AuditAction::FieldTypeChanged,
        AuditAction::FieldsReordered,
        AuditAction::OptionCreated,
        AuditAction::OptionUpdated,
        AuditAction::RecordCreated,
        AuditAction::CellUpdated,
        AuditAction::CommentCreated,
        AuditAction::Trashed,
        AuditAction::Restored,
        AuditAction::DeletedPermanently,
        AuditAction::TrashEmptied,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserUpdated => "USER_UPDATED",
            Self::WorkspaceCreated => "WORKSPACE_CREATED",
            Self::WorkspaceRenamed => "WORKSPACE_RENAMED",
            Self::BaseCreated => "BASE_CREATED",
            Self::BaseRenamed => "BASE_RENAMED",
            Self::BaseVisibilityChanged => "BASE_VISIBILITY_CHANGED",
            Self::MemberAdded => "MEMBER_ADDED",
            Self::MemberRoleChanged => "MEMBER_ROLE_CHANGED",
            Self::MemberRemoved => "MEMBER_REMOVED",
            Self::TableCreated => "TABLE_CREATED",
            Self::TableRenamed => "TABLE_RENAMED",
            Self::TablesReordered => "TABLES_REORDERED",
            Self::FieldCreated => "FIELD_CREATED",
            Self::FieldRenamed => "FIELD_RENAMED",
            Self::FieldTypeChanged => "FIELD_TYPE_CHANGED",
            Self::FieldsReordered => "FIELDS_REORDERED",
            Self::OptionCreated => "OPTION_CREATED",
            Self::OptionUpdated => "OPTION_UPDATED",
            Self::RecordCreated => "RECORD_CREATED",
            Self::CellUpdated => "CELL_UPDATED",
            Self::CommentCreated => "COMMENT_CREATED",
            Self::Trashed => "TRASHED",
            Self::Restored => "RESTORED",
            Self::DeletedPermanently => "DELETED_PERMANENTLY",
            Self::TrashEmptied => "TRASH_EMPTIED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only audit log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub base_id: Option<BaseId>,
    pub table_id: Option<TableId>,
    pub record_id: Option<RecordId>,
    pub field_id: Option<FieldId>,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub summary: String,
    pub details: serde_json::Value,
    /// Stored for forensics; never part of [`AuditEventView`].
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Starts an event with no scope ids and empty details.
    pub fn new(action: AuditAction, summary: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: AuditEventId::new(),
            base_id: None,
            table_id: None,
            record_id: None,
            field_id: None,
            user_id: None,
            action,
            summary: summary.into(),
            details: serde_json::Value::Null,
            ip_address: None,
            created_at: at,
        }
    }

    pub fn by(mut self, user: UserId) -> Self {
        self.user_id = Some(user);
        self
    }

    pub fn in_base(mut self, base: BaseId) -> Self {
        self.base_id = Some(base);
        self
    }

    pub fn in_table(mut self, table: TableId) -> Self {
        self.table_id = Some(table);
        self
    }

    pub fn on_record(mut self, record: RecordId) -> Self {
        self.record_id = Some(record);
        self
    }

    pub fn on_field(mut self, field: FieldId) -> Self {
        self.field_id = Some(field);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// The client-facing projection of an [`AuditEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEventView {
    pub id: AuditEventId,
    pub base_id: Option<BaseId>,
    pub table_id: Option<TableId>,
    pub record_id: Option<RecordId>,
    pub field_id: Option<FieldId>,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub summary: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditEvent> for AuditEventView {
    fn from(event: AuditEvent) -> Self {
        Self {
            id: event.id,
            base_id: event.base_id,
            table_id: event.table_id,
            record_id: event.record_id,
            field_id: event.field_id,
            user_id: event.user_id,
            action: event.action,
            summary: event.summary,
            details: event.details,
            created_at: event.created_at,
        }
    }
}
