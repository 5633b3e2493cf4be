//! Record rows.

use crate::codec::{format_ts, trash_at, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{RecordRow, TrashState};
use tabula_types::{RecordId, TableId, UserId};

const COLUMNS: &str = "id, table_id, created_by, trashed_at, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<RecordRow> {
    Ok(RecordRow {
        id: RecordId::new(row.get(0)?),
        table_id: TableId::new(row.get(1)?),
        created_by: row.get::<_, Option<i64>>(2)?.map(UserId::new),
        trash: trash_at(row, 3)?,
        created_at: ts_at(row, 4)?,
        updated_at: ts_at(row, 5)?,
    })
}

pub fn insert(
    conn: &Connection,
    table: TableId,
    created_by: Option<UserId>,
    at: DateTime<Utc>,
) -> StoreResult<RecordRow> {
    conn.execute(
        "INSERT INTO records (table_id, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
        params![table.get(), created_by.map(UserId::get), format_ts(at)],
    )?;
    Ok(RecordRow {
        id: RecordId::new(conn.last_insert_rowid()),
        table_id: table,
        created_by,
        trash: TrashState::ACTIVE,
        created_at: at,
        updated_at: at,
    })
}

pub fn get(conn: &Connection, id: RecordId) -> StoreResult<Option<RecordRow>> {
    let sql = format!("SELECT {COLUMNS} FROM records WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

pub fn list_active(conn: &Connection, table: TableId) -> StoreResult<Vec<RecordRow>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM records WHERE table_id = ?1 AND is_trashed = 0 ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![table.get()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn touch(conn: &Connection, id: RecordId, at: DateTime<Utc>) -> StoreResult<()> {
    conn.execute(
        "UPDATE records SET updated_at = ?2 WHERE id = ?1",
        params![id.get(), format_ts(at)],
    )?;
    Ok(())
}
