use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use tabula_model::{
    AuditAction, AuditEvent, AuditEventView, BaseRole, CellValue, EntityKind, FieldType, NameRule,
    PlatformRole, TrashState, Visibility,
};
use tabula_types::{BaseId, OptionId, UserId};

// ── Enums ────────────────────────────────────────────────────────

#[test]
fn field_type_parses_case_insensitively() {
    assert_eq!("single_select".parse::<FieldType>().unwrap(), FieldType::SingleSelect);
    assert_eq!("LONG_TEXT".parse::<FieldType>().unwrap(), FieldType::LongText);
    assert!("RICH_TEXT".parse::<FieldType>().is_err());
}

#[test]
fn field_type_serializes_screaming_snake() {
    let json = serde_json::to_string(&FieldType::MultiSelect).unwrap();
    assert_eq!(json, "\"MULTI_SELECT\"");
}

#[test]
fn only_select_types_are_select() {
    let selects: Vec<_> = FieldType::ALL.into_iter().filter(|t| t.is_select()).collect();
    assert_eq!(selects, vec![FieldType::SingleSelect, FieldType::MultiSelect]);
}

#[test]
fn base_role_total_order() {
    assert!(BaseRole::Viewer < BaseRole::Commenter);
    assert!(BaseRole::Commenter < BaseRole::Editor);
    assert!(BaseRole::Editor.is_at_least(BaseRole::Viewer));
    assert!(BaseRole::Commenter.is_at_least(BaseRole::Commenter));
    assert!(!BaseRole::Viewer.is_at_least(BaseRole::Commenter));
}

#[test]
fn roles_and_visibility_parse() {
    assert_eq!("editor".parse::<BaseRole>().unwrap(), BaseRole::Editor);
    assert_eq!("SYSADMIN".parse::<PlatformRole>().unwrap(), PlatformRole::Sysadmin);
    assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
    assert!("OWNER".parse::<BaseRole>().is_err());
    assert_eq!(Visibility::default(), Visibility::Private);
}

// ── Trash state ──────────────────────────────────────────────────

#[test]
fn trash_state_flag_tracks_timestamp() {
    assert!(!TrashState::ACTIVE.is_trashed());
    assert_eq!(TrashState::ACTIVE.trashed_at(), None);

    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let trashed = TrashState::trashed(at);
    assert!(trashed.is_trashed());
    assert_eq!(trashed.trashed_at(), Some(at));
}

// ── Entity kinds ─────────────────────────────────────────────────

#[test]
fn workspace_cascades_to_bases_and_bases_to_tables() {
    let ws = EntityKind::Workspace.cascade_children();
    assert_eq!(ws.len(), 1);
    assert_eq!(ws[0].child, EntityKind::Base);
    assert_eq!(ws[0].foreign_key, "workspace_id");

    let base = EntityKind::Base.cascade_children();
    assert_eq!(base[0].child, EntityKind::Table);
}

#[test]
fn table_does_not_cascade() {
    assert!(EntityKind::Table.cascade_children().is_empty());
    assert!(EntityKind::Record.cascade_children().is_empty());
}

#[test]
fn cascade_edges_agree_with_parent_links() {
    for kind in EntityKind::ALL {
        for edge in kind.cascade_children() {
            assert_eq!(edge.child.parent(), Some(kind));
        }
    }
}

#[test]
fn purge_order_puts_children_first() {
    let order = EntityKind::PURGE_ORDER;
    let index = |k: EntityKind| order.iter().position(|x| *x == k).unwrap();
    for kind in EntityKind::ALL {
        if let Some(parent) = kind.parent() {
            assert!(index(kind) < index(parent), "{kind} must purge before {parent}");
        }
    }
}

#[test]
fn name_rules() {
    for kind in [EntityKind::Workspace, EntityKind::Base, EntityKind::Table] {
        assert_eq!(kind.name_rule(), NameRule::CaseInsensitive);
    }
    assert_eq!(EntityKind::Field.name_rule(), NameRule::CaseInsensitive);
    assert_eq!(EntityKind::SelectOption.name_rule(), NameRule::CaseInsensitive);
    assert_eq!(EntityKind::Comment.name_rule(), NameRule::Unnamed);
}

#[test]
fn entity_kind_parses() {
    assert_eq!("option".parse::<EntityKind>().unwrap(), EntityKind::SelectOption);
    assert_eq!("select_option".parse::<EntityKind>().unwrap(), EntityKind::SelectOption);
    assert_eq!("Table".parse::<EntityKind>().unwrap(), EntityKind::Table);
    assert!("row".parse::<EntityKind>().is_err());
}

// ── Cells ────────────────────────────────────────────────────────

#[test]
fn cell_value_fits_only_its_type() {
    let value = CellValue::Minutes(90);
    for t in FieldType::ALL {
        assert_eq!(value.fits(t), t == FieldType::Time);
    }
}

#[test]
fn multi_option_lists_ids() {
    let v = CellValue::MultiOption(vec![OptionId::new(1), OptionId::new(4)]);
    assert_eq!(v.option_ids(), &[OptionId::new(1), OptionId::new(4)]);
}

// ── Audit ────────────────────────────────────────────────────────

#[test]
fn audit_view_drops_ip_address() {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let mut event = AuditEvent::new(AuditAction::TableCreated, "created table", at)
        .by(UserId::new(1))
        .in_base(BaseId::new(5))
        .with_details(serde_json::json!({"name": "Contacts"}));
    event.ip_address = Some("10.0.0.1".into());

    let view = AuditEventView::from(event);
    let json = serde_json::to_value(&view).unwrap();
    assert!(json.get("ip_address").is_none());
    assert_eq!(json["details"]["name"], "Contacts");
    assert_eq!(view.base_id, Some(BaseId::new(5)));
}

#[test]
fn audit_action_names_round_trip() {
    for action in AuditAction::ALL {
        assert_eq!(AuditAction::parse(action.as_str()), Some(action));
    }
    assert_eq!(AuditAction::parse("NOPE"), None);
}
