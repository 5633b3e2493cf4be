//! Select option rows.

use crate::codec::{format_ts, trash_at};
use crate::error::StoreResult;
use crate::trash::active_chain_predicate;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{EntityKind, SelectOption, TrashState};
use tabula_types::{FieldId, OptionId};

const COLUMNS: &str = "id, field_id, label, color, position, trashed_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<SelectOption> {
    Ok(SelectOption {
        id: OptionId::new(row.get(0)?),
        field_id: FieldId::new(row.get(1)?),
        label: row.get(2)?,
        color: row.get(3)?,
        position: row.get(4)?,
        trash: trash_at(row, 5)?,
    })
}

pub fn insert(
    conn: &Connection,
    field: FieldId,
    label: &str,
    color: Option<&str>,
    position: i64,
    at: DateTime<Utc>,
) -> StoreResult<SelectOption> {
    conn.execute(
        "INSERT INTO select_options (field_id, label, color, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![field.get(), label, color, position, format_ts(at)],
    )?;
    Ok(SelectOption {
        id: OptionId::new(conn.last_insert_rowid()),
        field_id: field,
        label: label.to_string(),
        color: color.map(str::to_string),
        position,
        trash: TrashState::ACTIVE,
    })
}

pub fn get(conn: &Connection, id: OptionId) -> StoreResult<Option<SelectOption>> {
    let sql = format!("SELECT {COLUMNS} FROM select_options WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

pub fn list_active(conn: &Connection, field: FieldId) -> StoreResult<Vec<SelectOption>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM select_options WHERE field_id = ?1 AND is_trashed = 0
         ORDER BY position, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![field.get()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// True when `option` is an active option of exactly `field`.
pub fn is_active_option_of(conn: &Connection, field: FieldId, option: OptionId) -> StoreResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM select_options
         WHERE id = ?1 AND field_id = ?2 AND is_trashed = 0)",
        params![option.get(), field.get()],
        |row| row.get(0),
    )?)
}

/// Updates label and/or color if the option and its ancestors are active.
pub fn update_if_active(
    conn: &Connection,
    id: OptionId,
    label: Option<&str>,
    color: Option<Option<&str>>,
    at: DateTime<Utc>,
) -> StoreResult<bool> {
    let sql = format!(
        "UPDATE select_options SET
            label = COALESCE(?2, label),
            color = CASE WHEN ?3 THEN ?4 ELSE color END,
            updated_at = ?5
         WHERE id = ?1 AND {}",
        active_chain_predicate(EntityKind::SelectOption)
    );
    let n = conn.execute(
        &sql,
        params![
            id.get(),
            label,
            color.is_some(),
            color.flatten(),
            format_ts(at)
        ],
    )?;
    Ok(n > 0)
}
