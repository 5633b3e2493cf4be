//! Property-based tests for cell value coercion.
//!
//! - Every minute of the day is accepted as an integer and as `HH:mm`
//! - Finite numbers survive coercion exactly
//! - Out-of-range times, unpadded clock parts and unknown checkbox tokens are rejected
//! - Multi-select ids come back sorted and deduplicated

use proptest::prelude::*;
use serde_json::{Value, json};
use tabula_core::ErrorKind;
use tabula_core::cells::coerce;
use tabula_model::{CellValue, FieldType};
use tabula_types::OptionId;

// =============================================================================
// TIME
// =============================================================================

proptest! {
    #[test]
    fn minutes_of_day_accepted(m in 0u16..1440) {
        prop_assert_eq!(
            coerce(FieldType::Time, &json!(m)).unwrap(),
            Some(CellValue::Minutes(m))
        );
    }

    #[test]
    fn clock_notation_matches_minutes(h in 0u16..24, m in 0u16..60) {
        prop_assert_eq!(
            coerce(FieldType::Time, &json!(format!("{h:02}:{m:02}"))).unwrap(),
            Some(CellValue::Minutes(h * 60 + m))
        );
    }

    #[test]
    fn single_digit_clock_parts_rejected(h in 0u16..10, m in 0u16..10, hour_short in any::<bool>()) {
        let text = if hour_short { format!("{h}:{m:02}") } else { format!("{h:02}:{m}") };
        let err = coerce(FieldType::Time, &json!(text)).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn minute_counts_as_text_rejected(m in 0u32..1440) {
        let err = coerce(FieldType::Time, &json!(m.to_string())).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn minutes_past_midnight_rejected(m in 1440u32..100_000) {
        let err = coerce(FieldType::Time, &json!(m)).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn hours_past_23_rejected(h in 24u16..100, m in 0u16..60) {
        let err = coerce(FieldType::Time, &json!(format!("{h}:{m:02}"))).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::BadRequest);
    }
}

// =============================================================================
// NUMBERS AND CHECKBOXES
// =============================================================================

proptest! {
    #[test]
    fn finite_numbers_kept(n in -1.0e12f64..1.0e12) {
        prop_assert_eq!(
            coerce(FieldType::Number, &json!(n)).unwrap(),
            Some(CellValue::Number(n))
        );
        prop_assert_eq!(
            coerce(FieldType::Currency, &json!(n.to_string())).unwrap(),
            Some(CellValue::Number(n))
        );
    }

    #[test]
    fn unknown_checkbox_tokens_rejected(token in "[a-z]{3,8}") {
        prop_assume!(!["true", "false", "off"].contains(&token.as_str()));
        let err = coerce(FieldType::Checkbox, &Value::String(token)).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::BadRequest);
    }

    #[test]
    fn text_is_stored_verbatim(s in "\\PC{1,40}") {
        prop_assert_eq!(
            coerce(FieldType::LongText, &json!(s.clone())).unwrap(),
            Some(CellValue::Text(s))
        );
    }
}

// =============================================================================
// SELECTS
// =============================================================================

proptest! {
    #[test]
    fn multi_select_ids_sorted_and_unique(ids in prop::collection::vec(1i64..50, 1..20)) {
        let Some(CellValue::MultiOption(got)) = coerce(FieldType::MultiSelect, &json!(ids)).unwrap() else {
            panic!("expected a multi-select value");
        };
        let mut want: Vec<OptionId> = ids.iter().copied().map(OptionId::new).collect();
        want.sort();
        want.dedup();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn non_positive_option_ids_rejected(id in -1000i64..=0) {
        let err = coerce(FieldType::SingleSelect, &json!(id)).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::BadRequest);
    }
}
