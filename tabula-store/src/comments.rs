//! Comment rows.

use crate::codec::{format_ts, trash_at, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{Comment, TrashState};
use tabula_types::{CommentId, RecordId, UserId};

const COLUMNS: &str = "id, record_id, author_id, body, trashed_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: CommentId::new(row.get(0)?),
        record_id: RecordId::new(row.get(1)?),
        author_id: UserId::new(row.get(2)?),
        body: row.get(3)?,
        trash: trash_at(row, 4)?,
        created_at: ts_at(row, 5)?,
    })
}

pub fn insert(
    conn: &Connection,
    record: RecordId,
    author: UserId,
    body: &str,
    at: DateTime<Utc>,
) -> StoreResult<Comment> {
    conn.execute(
        "INSERT INTO comments (record_id, author_id, body, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![record.get(), author.get(), body, format_ts(at)],
    )?;
    Ok(Comment {
        id: CommentId::new(conn.last_insert_rowid()),
        record_id: record,
        author_id: author,
        body: body.to_string(),
        trash: TrashState::ACTIVE,
        created_at: at,
    })
}

pub fn get(conn: &Connection, id: CommentId) -> StoreResult<Option<Comment>> {
    let sql = format!("SELECT {COLUMNS} FROM comments WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

/// Active comments on a record, oldest first.
pub fn list_active(conn: &Connection, record: RecordId) -> StoreResult<Vec<Comment>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM comments WHERE record_id = ?1 AND is_trashed = 0
         ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![record.get()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
