//! Append-only audit event rows.

use crate::codec::{format_ts, ts_at};
use crate::error::StoreResult;
use rusqlite::{Connection, Row, params};
use tabula_model::{AuditAction, AuditEvent};
use tabula_types::{AuditEventId, BaseId, FieldId, RecordId, TableId, UserId};

fn from_row(row: &Row<'_>) -> rusqlite::Result<AuditEvent> {
    let conversion = |idx: usize, msg: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            msg.into(),
        )
    };
    let event_id: String = row.get(0)?;
    let action: String = row.get(6)?;
    let details: String = row.get(8)?;
    Ok(AuditEvent {
        id: AuditEventId::parse(&event_id).map_err(|e| conversion(0, e.to_string()))?,
        base_id: row.get::<_, Option<i64>>(1)?.map(BaseId::new),
        table_id: row.get::<_, Option<i64>>(2)?.map(TableId::new),
        record_id: row.get::<_, Option<i64>>(3)?.map(RecordId::new),
        field_id: row.get::<_, Option<i64>>(4)?.map(FieldId::new),
        user_id: row.get::<_, Option<i64>>(5)?.map(UserId::new),
        action: AuditAction::parse(&action)
            .ok_or_else(|| conversion(6, format!("unknown audit action {action}")))?,
        summary: row.get(7)?,
        details: serde_json::from_str(&details).map_err(|e| conversion(8, e.to_string()))?,
        ip_address: row.get(9)?,
        created_at: ts_at(row, 10)?,
    })
}

pub fn insert(conn: &Connection, event: &AuditEvent) -> StoreResult<()> {
    let details = serde_json::to_string(&event.details)?;
    conn.execute(
        "INSERT INTO audit_events (event_id, base_id, table_id, record_id, field_id, user_id,
             action, summary, details, ip_address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            event.id.to_string(),
            event.base_id.map(BaseId::get),
            event.table_id.map(TableId::get),
            event.record_id.map(RecordId::get),
            event.field_id.map(FieldId::get),
            event.user_id.map(UserId::get),
            event.action.as_str(),
            event.summary,
            details,
            event.ip_address,
            format_ts(event.created_at)
        ],
    )?;
    Ok(())
}

/// Events of one base, newest first.
pub fn list_for_base(
    conn: &Connection,
    base: BaseId,
    limit: usize,
    offset: usize,
) -> StoreResult<Vec<AuditEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, base_id, table_id, record_id, field_id, user_id, action, summary,
                details, ip_address, created_at
         FROM audit_events WHERE base_id = ?1 ORDER BY id DESC LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt
        .query_map(
            params![base.get(), limit as i64, offset as i64],
            from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
