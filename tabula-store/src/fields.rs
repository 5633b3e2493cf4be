//! Field rows.

use crate::codec::{enum_at, format_ts, trash_at, ts_at};
use crate::error::StoreResult;
use crate::trash::active_chain_predicate;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{EntityKind, Field, FieldType, TrashState};
use tabula_types::{FieldId, TableId};

const COLUMNS: &str = "id, table_id, name, field_type, position, trashed_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Field> {
    Ok(Field {
        id: FieldId::new(row.get(0)?),
        table_id: TableId::new(row.get(1)?),
        name: row.get(2)?,
        field_type: enum_at(row, 3)?,
        position: row.get(4)?,
        trash: trash_at(row, 5)?,
        created_at: ts_at(row, 6)?,
    })
}

pub fn insert(
    conn: &Connection,
    table: TableId,
    name: &str,
    field_type: FieldType,
    position: i64,
    at: DateTime<Utc>,
) -> StoreResult<Field> {
    conn.execute(
        "INSERT INTO fields (table_id, name, field_type, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![table.get(), name, field_type.as_str(), position, format_ts(at)],
    )?;
    Ok(Field {
        id: FieldId::new(conn.last_insert_rowid()),
        table_id: table,
        name: name.to_string(),
        field_type,
        position,
        trash: TrashState::ACTIVE,
        created_at: at,
    })
}

pub fn get(conn: &Connection, id: FieldId) -> StoreResult<Option<Field>> {
    let sql = format!("SELECT {COLUMNS} FROM fields WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

/// Active fields of a table in position order.
pub fn list_active(conn: &Connection, table: TableId) -> StoreResult<Vec<Field>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM fields WHERE table_id = ?1 AND is_trashed = 0 ORDER BY position, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![table.get()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Sets the type if the field and every ancestor are active.
pub fn set_type_if_active(
    conn: &Connection,
    id: FieldId,
    field_type: FieldType,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let sql = format!(
        "UPDATE fields SET field_type = ?2, updated_at = ?3 WHERE id = ?1 AND {}",
        active_chain_predicate(EntityKind::Field)
    );
    let n = conn.execute(&sql, params![id.get(), field_type.as_str(), format_ts(at)])?;
    Ok(n > 0)
}
