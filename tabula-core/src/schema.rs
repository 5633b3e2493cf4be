//! Field definitions, select options and type changes.

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::{self, ensure_active};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tabula_model::{EntityKind, Field, FieldType, SelectOption};
use tabula_store::{cells, fields, options, trash};
use tabula_types::{FieldId, TableId};
use tracing::debug;

/// An option supplied when creating or retyping a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionInput {
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl OptionInput {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: None,
        }
    }

    pub fn colored(label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            color: Some(color.into()),
        }
    }
}

/// Trims a user-supplied name and rejects blanks.
pub fn required_name(what: &str, raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::bad_request(format!("{what} name is required")));
    }
    Ok(name.to_string())
}

fn check_options_for(field_type: FieldType, opts: Option<&[OptionInput]>) -> DomainResult<()> {
    match (field_type.is_select(), opts) {
        (true, None) => Err(DomainError::bad_request(format!(
            "{field_type} fields need at least one option"
        ))),
        (true, Some([])) => Err(DomainError::bad_request(format!(
            "{field_type} fields need at least one option"
        ))),
        (false, Some(o)) if !o.is_empty() => Err(DomainError::bad_request(format!(
            "{field_type} fields do not take options"
        ))),
        _ => Ok(()),
    }
}

/// Appends options to a field after its active ones.
pub fn append_options(
    conn: &Connection,
    field: FieldId,
    opts: &[OptionInput],
    at: DateTime<Utc>,
) -> DomainResult<Vec<SelectOption>> {
    let mut position = trash::next_position(conn, EntityKind::SelectOption, field.get())?;
    let mut created = Vec::with_capacity(opts.len());
    for input in opts {
        let label = required_name("option", &input.label)?;
        let color = input.color.as_deref().map(str::trim).filter(|c| !c.is_empty());
        created.push(options::insert(conn, field, &label, color, position, at)?);
        position += 1;
    }
    Ok(created)
}

/// Creates a field at the end of the table.
pub fn create_field(
    conn: &Connection,
    table: TableId,
    name: &str,
    field_type: FieldType,
    opts: Option<&[OptionInput]>,
    at: DateTime<Utc>,
) -> DomainResult<(Field, Vec<SelectOption>)> {
    let name = required_name("field", name)?;
    check_options_for(field_type, opts)?;
    ensure_active(conn, EntityKind::Table, table.get())?;

    let position = trash::next_position(conn, EntityKind::Field, table.get())?;
    let field = fields::insert(conn, table, &name, field_type, position, at)?;
    let created = match opts {
        Some(o) if field_type.is_select() => append_options(conn, field.id, o, at)?,
        _ => Vec::new(),
    };
    debug!("created {field_type} field {} in table {table}", field.id);
    Ok((field, created))
}

/// Changes a field's type.
///
/// Refused with `Conflict` while any cell of the field holds data. Leaving a
/// select type trashes the options; entering one requires new options.
pub fn change_field_type(
    conn: &Connection,
    field: FieldId,
    new_type: FieldType,
    opts: Option<&[OptionInput]>,
    at: DateTime<Utc>,
) -> DomainResult<Field> {
    let current = fields::get(conn, field)?.ok_or_else(|| DomainError::not_found("field"))?;
    ensure_active(conn, EntityKind::Field, field.get())?;

    let old_type = current.field_type;
    if old_type == new_type {
        return Ok(current);
    }
    if cells::field_has_data(conn, field)? {
        return Err(DomainError::conflict(format!(
            "field {:?} has data, clear it before changing its type",
            current.name
        )));
    }

    match (old_type.is_select(), new_type.is_select()) {
        (true, false) => {
            check_options_for(new_type, opts)?;
            for option in options::list_active(conn, field)? {
                lifecycle::soft_delete(conn, EntityKind::SelectOption, option.id.get(), at)?;
            }
            cells::clear_field(conn, field, at)?;
        }
        (false, true) => {
            check_options_for(new_type, opts)?;
            if let Some(o) = opts {
                append_options(conn, field, o, at)?;
            }
        }
        (true, true) => {
            if let Some(o) = opts {
                append_options(conn, field, o, at)?;
            }
        }
        (false, false) => check_options_for(new_type, opts)?,
    }

    if !fields::set_type_if_active(conn, field, new_type, at)? {
        return Err(DomainError::in_trash("field"));
    }
    debug!("field {field} retyped {old_type} -> {new_type}");
    Ok(Field {
        field_type: new_type,
        ..current
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn blank_names_rejected() {
        assert_eq!(required_name("table", "  ").unwrap_err().kind, ErrorKind::BadRequest);
        assert_eq!(required_name("table", " Leads ").unwrap(), "Leads");
    }

    #[test]
    fn select_types_need_options() {
        let opts = [OptionInput::new("A")];
        assert!(check_options_for(FieldType::SingleSelect, Some(&opts)).is_ok());
        assert!(check_options_for(FieldType::MultiSelect, Some(&[])).is_err());
        assert!(check_options_for(FieldType::SingleSelect, None).is_err());
        assert!(check_options_for(FieldType::Text, Some(&opts)).is_err());
        assert!(check_options_for(FieldType::Text, None).is_ok());
    }
}
