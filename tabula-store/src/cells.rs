//! Physical layout of [`CellValue`]s.
//!
//! A `record_cells` row has one nullable column per scalar representation;
//! exactly one is set for a non-empty scalar cell. Multi-select cells leave
//! every slot null and own `record_cell_options` links instead.

use crate::codec::{format_date, format_ts, opt_date_at, opt_ts_at};
use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tabula_model::{CellValue, Field, FieldType, RecordCell};
use tabula_types::{FieldId, OptionId, RecordId};

const CLEAR_SLOTS: &str = "string_value = NULL, number_value = NULL, bool_value = NULL, \
     date_value = NULL, datetime_value = NULL, time_minutes = NULL, select_option_id = NULL";

/// The scalar columns of one cell row.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CellSlots {
    pub string_value: Option<String>,
    pub number_value: Option<f64>,
    pub bool_value: Option<bool>,
    pub date_value: Option<String>,
    pub datetime_value: Option<String>,
    pub time_minutes: Option<i64>,
    pub select_option_id: Option<i64>,
}

impl CellSlots {
    /// Spreads a scalar value over its slot. Multi-select values have no
    /// scalar representation and yield all-null slots.
    pub fn from_value(value: &CellValue) -> Self {
        let mut slots = Self::default();
        match value {
            CellValue::Text(s) => slots.string_value = Some(s.clone()),
            CellValue::Number(n) => slots.number_value = Some(*n),
            CellValue::Bool(b) => slots.bool_value = Some(*b),
            CellValue::Date(d) => slots.date_value = Some(format_date(*d)),
            CellValue::DateTime(t) => slots.datetime_value = Some(format_ts(*t)),
            CellValue::Minutes(m) => slots.time_minutes = Some(i64::from(*m)),
            CellValue::SingleOption(id) => slots.select_option_id = Some(id.get()),
            CellValue::MultiOption(_) => {}
        }
        slots
    }
}

/// Writes a scalar value, creating the cell row if needed.
pub fn upsert_scalar(
    conn: &Connection,
    record: RecordId,
    field: FieldId,
    value: &CellValue,
    at: DateTime<Utc>,
) -> StoreResult<()> {
    if matches!(value, CellValue::MultiOption(_)) {
        return Err(StoreError::InvalidData(
            "multi-select values are stored as links".into(),
        ));
    }
    let s = CellSlots::from_value(value);
    conn.execute(
        "INSERT INTO record_cells (record_id, field_id, string_value, number_value, bool_value,
             date_value, datetime_value, time_minutes, select_option_id, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(record_id, field_id) DO UPDATE SET
             string_value = excluded.string_value,
             number_value = excluded.number_value,
             bool_value = excluded.bool_value,
             date_value = excluded.date_value,
             datetime_value = excluded.datetime_value,
             time_minutes = excluded.time_minutes,
             select_option_id = excluded.select_option_id,
             updated_at = excluded.updated_at",
        params![
            record.get(),
            field.get(),
            s.string_value,
            s.number_value,
            s.bool_value,
            s.date_value,
            s.datetime_value,
            s.time_minutes,
            s.select_option_id,
            format_ts(at)
        ],
    )?;
    Ok(())
}

/// Id of the cell row for (record, field), creating an empty one if absent.
pub fn ensure_cell(
    conn: &Connection,
    record: RecordId,
    field: FieldId,
    at: DateTime<Utc>,
) -> StoreResult<i64> {
    conn.execute(
        "INSERT INTO record_cells (record_id, field_id, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(record_id, field_id) DO UPDATE SET updated_at = excluded.updated_at",
        params![record.get(), field.get(), format_ts(at)],
    )?;
    Ok(conn.query_row(
        "SELECT id FROM record_cells WHERE record_id = ?1 AND field_id = ?2",
        params![record.get(), field.get()],
        |row| row.get(0),
    )?)
}

fn cell_id(conn: &Connection, record: RecordId, field: FieldId) -> StoreResult<Option<i64>> {
    Ok(conn
        .query_row(
            "SELECT id FROM record_cells WHERE record_id = ?1 AND field_id = ?2",
            params![record.get(), field.get()],
            |row| row.get(0),
        )
        .optional()?)
}

/// Options linked to a multi-select cell, ascending by id.
pub fn linked_options(conn: &Connection, cell: i64) -> StoreResult<Vec<OptionId>> {
    let mut stmt = conn.prepare(
        "SELECT option_id FROM record_cell_options WHERE record_cell_id = ?1 ORDER BY option_id",
    )?;
    let ids = stmt
        .query_map(params![cell], |row| Ok(OptionId::new(row.get(0)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn link(conn: &Connection, cell: i64, option: OptionId) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO record_cell_options (record_cell_id, option_id) VALUES (?1, ?2)",
        params![cell, option.get()],
    )?;
    Ok(())
}

pub fn unlink(conn: &Connection, cell: i64, option: OptionId) -> StoreResult<()> {
    conn.execute(
        "DELETE FROM record_cell_options WHERE record_cell_id = ?1 AND option_id = ?2",
        params![cell, option.get()],
    )?;
    Ok(())
}

/// Empties one cell: every slot nulled, every link removed.
pub fn clear_cell(
    conn: &Connection,
    record: RecordId,
    field: FieldId,
    at: DateTime<Utc>,
) -> StoreResult<()> {
    let Some(cell) = cell_id(conn, record, field)? else {
        return Ok(());
    };
    conn.execute(
        &format!("UPDATE record_cells SET {CLEAR_SLOTS}, updated_at = ?2 WHERE id = ?1"),
        params![cell, format_ts(at)],
    )?;
    conn.execute(
        "DELETE FROM record_cell_options WHERE record_cell_id = ?1",
        params![cell],
    )?;
    Ok(())
}

/// Empties every cell of a field. Returns the number of cell rows touched.
pub fn clear_field(conn: &Connection, field: FieldId, at: DateTime<Utc>) -> StoreResult<usize> {
    let touched = conn.execute(
        &format!("UPDATE record_cells SET {CLEAR_SLOTS}, updated_at = ?2 WHERE field_id = ?1"),
        params![field.get(), format_ts(at)],
    )?;
    conn.execute(
        "DELETE FROM record_cell_options
         WHERE record_cell_id IN (SELECT id FROM record_cells WHERE field_id = ?1)",
        params![field.get()],
    )?;
    Ok(touched)
}

/// Drops every reference to one option, single- or multi-select.
pub fn clear_option_references(
    conn: &Connection,
    option: OptionId,
    at: DateTime<Utc>,
) -> StoreResult<usize> {
    let singles = conn.execute(
        "UPDATE record_cells SET select_option_id = NULL, updated_at = ?2
         WHERE select_option_id = ?1",
        params![option.get(), format_ts(at)],
    )?;
    let links = conn.execute(
        "DELETE FROM record_cell_options WHERE option_id = ?1",
        params![option.get()],
    )?;
    Ok(singles + links)
}

/// Whether any cell of the field holds a value in any representation.
pub fn field_has_data(conn: &Connection, field: FieldId) -> StoreResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM record_cells
             WHERE field_id = ?1 AND (
                 string_value IS NOT NULL OR number_value IS NOT NULL
                 OR bool_value IS NOT NULL OR date_value IS NOT NULL
                 OR datetime_value IS NOT NULL OR time_minutes IS NOT NULL
                 OR select_option_id IS NOT NULL
                 OR EXISTS(SELECT 1 FROM record_cell_options o WHERE o.record_cell_id = record_cells.id)
             )
         )",
        params![field.get()],
        |row| row.get(0),
    )?)
}

/// Decodes one cell according to the field's current type. `None` when the
/// cell is absent or empty.
pub fn read(conn: &Connection, record: RecordId, field: &Field) -> StoreResult<Option<CellValue>> {
    let row = conn
        .query_row(
            "SELECT id, string_value, number_value, bool_value, date_value, datetime_value,
                    time_minutes, select_option_id
             FROM record_cells WHERE record_id = ?1 AND field_id = ?2",
            params![record.get(), field.id.get()],
            |row| {
                let id: i64 = row.get(0)?;
                let value = match field.field_type {
                    FieldType::Text | FieldType::LongText => {
                        row.get::<_, Option<String>>(1)?.map(CellValue::Text)
                    }
                    FieldType::Number | FieldType::Currency => {
                        row.get::<_, Option<f64>>(2)?.map(CellValue::Number)
                    }
                    FieldType::Checkbox => row.get::<_, Option<bool>>(3)?.map(CellValue::Bool),
                    FieldType::Date => opt_date_at(row, 4)?.map(CellValue::Date),
                    FieldType::Datetime => opt_ts_at(row, 5)?.map(CellValue::DateTime),
                    FieldType::Time => row
                        .get::<_, Option<u16>>(6)?
                        .map(CellValue::Minutes),
                    FieldType::SingleSelect => row
                        .get::<_, Option<i64>>(7)?
                        .map(|id| CellValue::SingleOption(OptionId::new(id))),
                    FieldType::MultiSelect => None,
                };
                Ok((id, value))
            },
        )
        .optional()?;

    match (row, field.field_type) {
        (Some((cell, _)), FieldType::MultiSelect) => {
            let ids = linked_options(conn, cell)?;
            Ok((!ids.is_empty()).then_some(CellValue::MultiOption(ids)))
        }
        (Some((_, value)), _) => Ok(value),
        (None, _) => Ok(None),
    }
}

/// Non-empty cells of a record for the given fields, in field order.
pub fn read_record(
    conn: &Connection,
    record: RecordId,
    fields: &[Field],
) -> StoreResult<Vec<RecordCell>> {
    let mut cells = Vec::new();
    for field in fields {
        if let Some(value) = read(conn, record, field)? {
            cells.push(RecordCell {
                record_id: record,
                field_id: field.id,
                value,
            });
        }
    }
    Ok(cells)
}
