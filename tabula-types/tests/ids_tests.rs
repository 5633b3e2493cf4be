use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;
use tabula_types::{AuditEventId, BaseId, FieldId, TableId};

// ── Row ids ───────────────────────────────────────────────────────

#[test]
fn row_id_display_and_parse() {
    let id = TableId::new(42);
    assert_eq!(id.to_string(), "42");
    assert_eq!(TableId::parse("42").unwrap(), id);
}

#[test]
fn row_id_parse_trims_whitespace() {
    assert_eq!(FieldId::parse(" 7 ").unwrap(), FieldId::new(7));
}

#[test]
fn row_id_rejects_zero_and_negative() {
    assert!(BaseId::parse("0").is_err());
    assert!(BaseId::parse("-3").is_err());
}

#[test]
fn row_id_rejects_garbage() {
    let err = BaseId::from_str("abc").unwrap_err();
    assert!(err.to_string().contains("invalid base id"));
}

#[test]
fn row_id_orders_numerically() {
    let mut ids = vec![TableId::new(10), TableId::new(2), TableId::new(7)];
    ids.sort();
    assert_eq!(ids, vec![TableId::new(2), TableId::new(7), TableId::new(10)]);
}

#[test]
fn row_id_serializes_transparently() {
    let json = serde_json::to_string(&FieldId::new(9)).unwrap();
    assert_eq!(json, "9");
    let parsed: FieldId = serde_json::from_str("9").unwrap();
    assert_eq!(parsed, FieldId::new(9));
}

#[test]
fn row_id_into_raw() {
    let raw: i64 = BaseId::new(5).into();
    assert_eq!(raw, 5);
}

// ── AuditEventId ──────────────────────────────────────────────────

#[test]
fn audit_event_id_new_is_unique() {
    let ids: HashSet<AuditEventId> = (0..100).map(|_| AuditEventId::new()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn audit_event_id_display_and_parse() {
    let id = AuditEventId::new();
    let parsed = AuditEventId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn audit_event_id_parse_invalid() {
    assert!(AuditEventId::parse("not-a-uuid").is_err());
}

proptest! {
    #[test]
    fn positive_ids_survive_display(raw in 1i64..i64::MAX) {
        let id = TableId::new(raw);
        prop_assert_eq!(TableId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn non_positive_ids_are_rejected(raw in i64::MIN..=0i64) {
        prop_assert!(TableId::parse(&raw.to_string()).is_err());
    }
}
