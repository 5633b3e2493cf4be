use super::{Platform, authorize, base_of, ensure_visible};
use crate::cells;
use crate::error::{DomainError, DomainResult};
use crate::lifecycle::ensure_active;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use tabula_access::{Action, Actor};
use tabula_model::{AuditAction, AuditEvent, CellValue, Comment, EntityKind, RecordCell, RecordRow};
use tabula_store::{cells as cell_rows, comments, fields, records};
use tabula_types::{FieldId, RecordId, TableId};

/// A record with the values of its table's active fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub record: RecordRow,
    pub cells: Vec<RecordCell>,
}

fn view(conn: &Connection, record: RecordRow) -> DomainResult<RecordView> {
    let active = fields::list_active(conn, record.table_id)?;
    let cells = cell_rows::read_record(conn, record.id, &active)?;
    Ok(RecordView { record, cells })
}

impl Platform {
    /// Creates a record and writes `values` one field at a time, in order,
    /// within the same transaction.
    pub fn create_record(
        &self,
        actor: Option<&Actor>,
        table: TableId,
        values: &[(FieldId, Value)],
    ) -> DomainResult<RecordView> {
        let now = self.now();
        let (ctx, base, view) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Table, table.get())?;
            let ctx = authorize(tx, actor, base, Action::RecordsCreate)?;
            ensure_active(tx, EntityKind::Table, table.get())?;
            let record = records::insert(tx, table, Some(ctx.actor.user_id), now)?;
            for (field, raw) in values {
                cells::write_cell(tx, table, record.id, *field, raw, now)?;
            }
            let record = records::get(tx, record.id)?.ok_or_else(DomainError::internal)?;
            Ok((ctx, base, view(tx, record)?))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::RecordCreated, format!("record {} created", view.record.id), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(table)
                .on_record(view.record.id)
                .with_details(serde_json::json!({ "fields": values.len() })),
        );
        Ok(view)
    }

    /// Writes one cell. `Value::Null` clears it.
    pub fn write_cell(
        &self,
        actor: Option<&Actor>,
        table: TableId,
        record: RecordId,
        field: FieldId,
        raw: &Value,
    ) -> DomainResult<Option<CellValue>> {
        let now = self.now();
        let (ctx, base, stored) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Table, table.get())?;
            let ctx = authorize(tx, actor, base, Action::RecordsUpdate)?;
            let stored = cells::write_cell(tx, table, record, field, raw, now)?;
            Ok((ctx, base, stored))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::CellUpdated, format!("cell of record {record} updated"), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(table)
                .on_record(record)
                .on_field(field)
                .with_details(serde_json::json!({ "value": stored })),
        );
        Ok(stored)
    }

    pub fn get_record(&self, actor: Option<&Actor>, id: RecordId) -> DomainResult<RecordView> {
        self.store.read(|conn| {
            let base = base_of(conn, EntityKind::Record, id.get())?;
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Record, id.get())?;
            let record = records::get(conn, id)?.ok_or_else(|| DomainError::not_found("record"))?;
            view(conn, record)
        })
    }

    pub fn list_records(&self, actor: Option<&Actor>, table: TableId) -> DomainResult<Vec<RecordView>> {
        self.store.read(|conn| {
            let base = base_of(conn, EntityKind::Table, table.get())?;
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Table, table.get())?;
            let active = fields::list_active(conn, table)?;
            records::list_active(conn, table)?
                .into_iter()
                .map(|record| -> DomainResult<RecordView> {
                    let cells = cell_rows::read_record(conn, record.id, &active)?;
                    Ok(RecordView { record, cells })
                })
                .collect()
        })
    }

    // ── comments ─────────────────────────────────────────────

    pub fn add_comment(&self, actor: Option<&Actor>, record: RecordId, body: &str) -> DomainResult<Comment> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::bad_request("comment body is required"));
        }
        let now = self.now();
        let (ctx, loc, comment) = self.store.transaction(|tx| -> DomainResult<_> {
            let loc = super::locate(tx, EntityKind::Record, record.get())?;
            let base = loc.base_id.ok_or_else(DomainError::internal)?;
            let ctx = authorize(tx, actor, base, Action::CommentsCreate)?;
            ensure_active(tx, EntityKind::Record, record.get())?;
            Ok((ctx, loc, comments::insert(tx, record, ctx.actor.user_id, body, now)?))
        })?;
        let mut event = AuditEvent::new(AuditAction::CommentCreated, format!("comment on record {record}"), now)
            .by(ctx.actor.user_id)
            .on_record(record)
            .with_details(serde_json::json!({ "comment_id": comment.id }));
        if let Some(base) = loc.base_id {
            event = event.in_base(base);
        }
        if let Some(table) = loc.table_id {
            event = event.in_table(table);
        }
        self.emit(event);
        Ok(comment)
    }

    pub fn list_comments(&self, actor: Option<&Actor>, record: RecordId) -> DomainResult<Vec<Comment>> {
        self.store.read(|conn| {
            let base = base_of(conn, EntityKind::Record, record.get())?;
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Record, record.get())?;
            Ok(comments::list_active(conn, record)?)
        })
    }
}
