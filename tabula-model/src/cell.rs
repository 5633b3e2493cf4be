//! Logical cell values.
//!
//! A cell holds at most one typed value determined by its field's
//! [`FieldType`]. How the union is laid out on disk is the store's concern.

use crate::schema::FieldType;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tabula_types::{FieldId, OptionId, RecordId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Minutes(u16),
    SingleOption(OptionId),
    /// Selected options, ascending by id.
    MultiOption(Vec<OptionId>),
}

impl CellValue {
    /// Whether this value is a legal representation for `field_type`.
    pub fn fits(&self, field_type: FieldType) -> bool {
        matches!(
            (self, field_type),
            (Self::Text(_), FieldType::Text | FieldType::LongText)
                | (Self::Number(_), FieldType::Number | FieldType::Currency)
                | (Self::Bool(_), FieldType::Checkbox)
                | (Self::Date(_), FieldType::Date)
                | (Self::DateTime(_), FieldType::Datetime)
                | (Self::Minutes(_), FieldType::Time)
                | (Self::SingleOption(_), FieldType::SingleSelect)
                | (Self::MultiOption(_), FieldType::MultiSelect)
        )
    }

    /// Options referenced by this value.
    pub fn option_ids(&self) -> &[OptionId] {
        match self {
            Self::SingleOption(id) => std::slice::from_ref(id),
            Self::MultiOption(ids) => ids,
            _ => &[],
        }
    }
}

/// One stored cell: the (record, field) pair and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCell {
    pub record_id: RecordId,
    pub field_id: FieldId,
    pub value: CellValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_fits_both_text_types() {
        let v = CellValue::Text("hi".into());
        assert!(v.fits(FieldType::Text));
        assert!(v.fits(FieldType::LongText));
        assert!(!v.fits(FieldType::Number));
    }

    #[test]
    fn option_ids_of_scalar_is_empty() {
        assert!(CellValue::Bool(true).option_ids().is_empty());
        assert_eq!(
            CellValue::SingleOption(OptionId::new(3)).option_ids(),
            &[OptionId::new(3)]
        );
    }
}
