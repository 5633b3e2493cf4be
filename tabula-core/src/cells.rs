//! Cell writes: raw input coercion and the select-option rules.
//!
//! Raw values arrive as JSON. `null` clears a cell. Everything else is
//! coerced by the field's type into a [`CellValue`] or rejected with
//! `BadRequest`.

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::ensure_active;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use std::collections::BTreeSet;
use tabula_model::{CellValue, EntityKind, FieldType};
use tabula_store::{cells, fields, options, records};
use tabula_types::{FieldId, OptionId, RecordId, TableId};
use tracing::debug;

const TRUTHY: [&str; 6] = ["1", "true", "sí", "si", "on", "y"];
const FALSY: [&str; 5] = ["0", "false", "no", "off", "n"];

/// Converts a raw value for a field of `field_type`.
///
/// Returns `None` for `null`, and for blank strings on non-text fields.
/// Option ids are only checked for shape here; [`write_cell`] checks that
/// they belong to the field.
pub fn coerce(field_type: FieldType, raw: &Value) -> DomainResult<Option<CellValue>> {
    if raw.is_null() {
        return Ok(None);
    }
    if let Value::String(s) = raw {
        if s.trim().is_empty() && !matches!(field_type, FieldType::Text | FieldType::LongText) {
            return Ok(None);
        }
    }

    let value = match field_type {
        FieldType::Text | FieldType::LongText => CellValue::Text(coerce_text(raw)?),
        FieldType::Number | FieldType::Currency => CellValue::Number(coerce_number(raw)?),
        FieldType::Checkbox => CellValue::Bool(coerce_bool(raw)?),
        FieldType::Date => CellValue::Date(coerce_date(raw)?),
        FieldType::Datetime => CellValue::DateTime(coerce_datetime(raw)?),
        FieldType::Time => CellValue::Minutes(coerce_minutes(raw)?),
        FieldType::SingleSelect => CellValue::SingleOption(coerce_option_id(raw)?),
        FieldType::MultiSelect => {
            let Value::Array(items) = raw else {
                return Err(DomainError::bad_request("expected an array of option ids"));
            };
            let ids = items
                .iter()
                .map(coerce_option_id)
                .collect::<DomainResult<BTreeSet<_>>>()?;
            CellValue::MultiOption(ids.into_iter().collect())
        }
    };
    Ok(Some(value))
}

fn coerce_text(raw: &Value) -> DomainResult<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(DomainError::bad_request("expected text")),
    }
}

fn coerce_number(raw: &Value) -> DomainResult<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<f64>()
                .ok()
                .or_else(|| s.replacen(',', ".", 1).parse::<f64>().ok())
        }
        _ => None,
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| DomainError::bad_request("expected a finite number"))
}

fn coerce_bool(raw: &Value) -> DomainResult<bool> {
    let token = match raw {
        Value::Bool(b) => return Ok(*b),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_lowercase(),
        _ => String::new(),
    };
    if TRUTHY.contains(&token.as_str()) {
        Ok(true)
    } else if FALSY.contains(&token.as_str()) {
        Ok(false)
    } else {
        Err(DomainError::bad_request(format!(
            "expected a checkbox value, got {raw}"
        )))
    }
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn coerce_date(raw: &Value) -> DomainResult<NaiveDate> {
    let Value::String(s) = raw else {
        return Err(DomainError::bad_request("expected a date"));
    };
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Utc).date_naive()))
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.date()))
        .ok_or_else(|| DomainError::bad_request(format!("invalid date {s:?}")))
}

fn coerce_datetime(raw: &Value) -> DomainResult<DateTime<Utc>> {
    let Value::String(s) = raw else {
        return Err(DomainError::bad_request("expected a datetime"));
    };
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.and_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
        .ok_or_else(|| DomainError::bad_request(format!("invalid datetime {s:?}")))
}

fn coerce_minutes(raw: &Value) -> DomainResult<u16> {
    let invalid = || DomainError::bad_request("expected minutes 0-1439 or HH:mm");
    let minutes = match raw {
        Value::Number(n) => n.as_u64().ok_or_else(invalid)?,
        Value::String(s) => {
            let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
            let two_digits = |p: &str| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit());
            if !two_digits(h) || !two_digits(m) {
                return Err(invalid());
            }
            let h: u64 = h.parse().map_err(|_| invalid())?;
            let m: u64 = m.parse().map_err(|_| invalid())?;
            if h > 23 || m > 59 {
                return Err(invalid());
            }
            h * 60 + m
        }
        _ => return Err(invalid()),
    };
    if minutes > 1439 {
        return Err(invalid());
    }
    u16::try_from(minutes).map_err(|_| invalid())
}

fn coerce_option_id(raw: &Value) -> DomainResult<OptionId> {
    let id = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
        .map(OptionId::new)
        .ok_or_else(|| DomainError::bad_request(format!("invalid option id {raw}")))
}

fn ensure_option(conn: &Connection, field: FieldId, option: OptionId) -> DomainResult<()> {
    if options::is_active_option_of(conn, field, option)? {
        Ok(())
    } else {
        Err(DomainError::bad_request(format!(
            "option {option} is not an active option of field {field}"
        )))
    }
}

/// Writes one cell of a record. Returns what the cell now holds.
///
/// Multi-select writes only add and remove the links that differ from the
/// current selection.
pub fn write_cell(
    conn: &Connection,
    table: TableId,
    record: RecordId,
    field: FieldId,
    raw: &Value,
    at: DateTime<Utc>,
) -> DomainResult<Option<CellValue>> {
    let field_def = fields::get(conn, field)?
        .filter(|f| f.table_id == table)
        .ok_or_else(|| DomainError::not_found("field"))?;
    records::get(conn, record)?
        .filter(|r| r.table_id == table)
        .ok_or_else(|| DomainError::not_found("record"))?;
    ensure_active(conn, EntityKind::Field, field.get())?;
    ensure_active(conn, EntityKind::Record, record.get())?;

    let value = coerce(field_def.field_type, raw)?;
    if let Some(value) = &value {
        debug_assert!(value.fits(field_def.field_type), "{value:?} for {}", field_def.field_type);
        for &option in value.option_ids() {
            ensure_option(conn, field, option)?;
        }
    }
    match &value {
        None => cells::clear_cell(conn, record, field, at)?,
        Some(CellValue::MultiOption(wanted)) => {
            let cell = cells::ensure_cell(conn, record, field, at)?;
            let current: BTreeSet<OptionId> =
                cells::linked_options(conn, cell)?.into_iter().collect();
            let wanted: BTreeSet<OptionId> = wanted.iter().copied().collect();
            for &option in wanted.difference(&current) {
                cells::link(conn, cell, option)?;
            }
            for &option in current.difference(&wanted) {
                cells::unlink(conn, cell, option)?;
            }
        }
        Some(scalar) => cells::upsert_scalar(conn, record, field, scalar, at)?,
    }
    records::touch(conn, record, at)?;

    debug!("wrote cell record={record} field={field}");
    let stored = cells::read(conn, record, &field_def)?;
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn kind_of(r: DomainResult<Option<CellValue>>) -> ErrorKind {
        r.unwrap_err().kind
    }

    #[test]
    fn number_accepts_comma_decimal() {
        assert_eq!(
            coerce(FieldType::Number, &json!("3,5")).unwrap(),
            Some(CellValue::Number(3.5))
        );
        assert_eq!(
            coerce(FieldType::Currency, &json!(10)).unwrap(),
            Some(CellValue::Number(10.0))
        );
    }

    #[test]
    fn number_rejects_non_finite() {
        assert_eq!(kind_of(coerce(FieldType::Number, &json!("inf"))), ErrorKind::BadRequest);
        assert_eq!(kind_of(coerce(FieldType::Number, &json!("NaN"))), ErrorKind::BadRequest);
        assert_eq!(kind_of(coerce(FieldType::Number, &json!("abc"))), ErrorKind::BadRequest);
    }

    #[test]
    fn checkbox_tokens() {
        for t in ["1", "TRUE", "Sí", "si", "on", "Y"] {
            assert_eq!(
                coerce(FieldType::Checkbox, &json!(t)).unwrap(),
                Some(CellValue::Bool(true)),
                "{t}"
            );
        }
        for t in ["0", "false", "No", "OFF", "n"] {
            assert_eq!(
                coerce(FieldType::Checkbox, &json!(t)).unwrap(),
                Some(CellValue::Bool(false)),
                "{t}"
            );
        }
        assert_eq!(kind_of(coerce(FieldType::Checkbox, &json!("maybe"))), ErrorKind::BadRequest);
        assert_eq!(kind_of(coerce(FieldType::Checkbox, &json!(2))), ErrorKind::BadRequest);
    }

    #[test]
    fn date_truncates_time_of_day() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            coerce(FieldType::Date, &json!("2024-03-09T22:15:00Z")).unwrap(),
            Some(CellValue::Date(d))
        );
        assert_eq!(
            coerce(FieldType::Date, &json!("2024-03-09")).unwrap(),
            Some(CellValue::Date(d))
        );
        assert_eq!(kind_of(coerce(FieldType::Date, &json!("2024-02-30"))), ErrorKind::BadRequest);
    }

    #[test]
    fn datetime_parses_offsets() {
        let v = coerce(FieldType::Datetime, &json!("2024-01-01T12:00:00+02:00")).unwrap();
        let expected = "2024-01-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(v, Some(CellValue::DateTime(expected)));
    }

    #[test]
    fn time_accepts_minutes_and_clock() {
        assert_eq!(coerce(FieldType::Time, &json!(0)).unwrap(), Some(CellValue::Minutes(0)));
        assert_eq!(coerce(FieldType::Time, &json!(1439)).unwrap(), Some(CellValue::Minutes(1439)));
        assert_eq!(coerce(FieldType::Time, &json!("09:30")).unwrap(), Some(CellValue::Minutes(570)));
        for bad in [json!(1440), json!(-1), json!("24:00"), json!("12:60"), json!("9:5:1")] {
            assert_eq!(kind_of(coerce(FieldType::Time, &bad)), ErrorKind::BadRequest, "{bad}");
        }
    }

    #[test]
    fn time_strings_need_two_digit_parts() {
        assert_eq!(coerce(FieldType::Time, &json!(" 23:59 ")).unwrap(), Some(CellValue::Minutes(1439)));
        for bad in ["9:30", "09:5", "9:5", "570", "0930", "009:30", "+9:30", "09:3a"] {
            assert_eq!(kind_of(coerce(FieldType::Time, &json!(bad))), ErrorKind::BadRequest, "{bad}");
        }
    }

    #[test]
    fn null_and_blank_clear() {
        assert_eq!(coerce(FieldType::Number, &Value::Null).unwrap(), None);
        assert_eq!(coerce(FieldType::Date, &json!("  ")).unwrap(), None);
        assert_eq!(
            coerce(FieldType::Text, &json!("")).unwrap(),
            Some(CellValue::Text(String::new()))
        );
    }

    #[test]
    fn multi_select_dedups_and_sorts() {
        assert_eq!(
            coerce(FieldType::MultiSelect, &json!([3, "1", 3])).unwrap(),
            Some(CellValue::MultiOption(vec![OptionId::new(1), OptionId::new(3)]))
        );
        assert_eq!(kind_of(coerce(FieldType::MultiSelect, &json!(1))), ErrorKind::BadRequest);
        assert_eq!(kind_of(coerce(FieldType::SingleSelect, &json!(0))), ErrorKind::BadRequest);
    }
}
