mod common;

use common::{Fixture, assert_kind, fixture};
use pretty_assertions::assert_eq;
use serde_json::json;
use tabula_core::{EntityKind, ErrorKind, OptionInput, TrashScope};
use tabula_model::{BaseRole, CellValue, Field, FieldType, SelectOption, TableDef};
use tabula_types::RecordId;

fn table(f: &Fixture) -> TableDef {
    f.platform.create_table(Some(&f.owner), f.base.id, "Deals").unwrap()
}

fn select(f: &Fixture, t: &TableDef, name: &str, ty: FieldType, labels: &[&str]) -> (Field, Vec<SelectOption>) {
    let opts: Vec<OptionInput> = labels.iter().map(|l| OptionInput::new(*l)).collect();
    f.platform
        .create_field(Some(&f.owner), t.id, name, ty, Some(&opts))
        .unwrap()
}

fn record(f: &Fixture, t: &TableDef) -> RecordId {
    f.platform.create_record(Some(&f.owner), t.id, &[]).unwrap().record.id
}

// ── field type changes ────────────────────────────────────────

#[test]
fn type_change_blocked_until_cell_cleared() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (status, opts) = select(&f, &t, "Status", FieldType::SingleSelect, &["A", "B"]);
    let rec = record(&f, &t);

    let stored = p
        .write_cell(Some(&f.owner), t.id, rec, status.id, &json!(opts[0].id))
        .unwrap();
    assert_eq!(stored, Some(CellValue::SingleOption(opts[0].id)));
    assert_kind(
        p.change_field_type(Some(&f.owner), status.id, FieldType::Text, None),
        ErrorKind::Conflict,
    );

    assert_eq!(
        p.write_cell(Some(&f.owner), t.id, rec, status.id, &json!(null)).unwrap(),
        None
    );
    let field = p
        .change_field_type(Some(&f.owner), status.id, FieldType::Text, None)
        .unwrap();
    assert_eq!(field.field_type, FieldType::Text);
    assert!(p.list_options(Some(&f.owner), status.id).unwrap().is_empty());
    let trashed = p
        .list_trash(Some(&f.owner), EntityKind::SelectOption, TrashScope::Parent(status.id.get()))
        .unwrap();
    assert_eq!(trashed.len(), 2);
}

#[test]
fn entering_a_select_type_needs_options() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (notes, _) = p
        .create_field(Some(&f.owner), t.id, "Notes", FieldType::Text, None)
        .unwrap();

    assert_kind(
        p.change_field_type(Some(&f.owner), notes.id, FieldType::MultiSelect, None),
        ErrorKind::BadRequest,
    );
    let field = p
        .change_field_type(
            Some(&f.owner),
            notes.id,
            FieldType::MultiSelect,
            Some(&[OptionInput::colored("Hot", "#f00")]),
        )
        .unwrap();
    assert_eq!(field.field_type, FieldType::MultiSelect);
    let opts = p.list_options(Some(&f.owner), notes.id).unwrap();
    assert_eq!(opts.len(), 1);
    assert_eq!(opts[0].color.as_deref(), Some("#f00"));
}

#[test]
fn create_field_validates_options() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    assert_kind(
        p.create_field(Some(&f.owner), t.id, "Stage", FieldType::SingleSelect, None),
        ErrorKind::BadRequest,
    );
    assert_kind(
        p.create_field(
            Some(&f.owner),
            t.id,
            "Amount",
            FieldType::Number,
            Some(&[OptionInput::new("x")]),
        ),
        ErrorKind::BadRequest,
    );
    assert_kind(
        p.create_field(Some(&f.owner), t.id, "   ", FieldType::Text, None),
        ErrorKind::BadRequest,
    );
}

#[test]
fn field_names_are_case_insensitive() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    p.create_field(Some(&f.owner), t.id, "Email", FieldType::Text, None)
        .unwrap();
    let err = p
        .create_field(Some(&f.owner), t.id, "EMAIL", FieldType::Text, None)
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.status_code(), 409);
}

#[test]
fn option_labels_unique_per_field() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (stage, opts) = select(&f, &t, "Stage", FieldType::SingleSelect, &["Open"]);
    assert_kind(
        p.add_option(Some(&f.owner), stage.id, "open", None),
        ErrorKind::Conflict,
    );
    let won = p.add_option(Some(&f.owner), stage.id, "Won", Some("green")).unwrap();
    assert_eq!(won.position, 2);

    let updated = p
        .update_option(Some(&f.owner), opts[0].id, Some("Lead"), Some(None))
        .unwrap();
    assert_eq!(updated.label, "Lead");
    assert_eq!(updated.color, None);
}

#[test]
fn options_only_on_select_fields() {
    let f = fixture();
    let t = table(&f);
    let (notes, _) = f
        .platform
        .create_field(Some(&f.owner), t.id, "Notes", FieldType::Text, None)
        .unwrap();
    assert_kind(
        f.platform.add_option(Some(&f.owner), notes.id, "x", None),
        ErrorKind::BadRequest,
    );
}

#[test]
fn option_cannot_return_to_non_select_field() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (stage, opts) = select(&f, &t, "Stage", FieldType::SingleSelect, &["Open"]);
    p.change_field_type(Some(&f.owner), stage.id, FieldType::Text, None)
        .unwrap();
    assert_kind(
        p.restore(Some(&f.owner), EntityKind::SelectOption, opts[0].id.get()),
        ErrorKind::Conflict,
    );
}

// ── select cells ──────────────────────────────────────────────

#[test]
fn multi_select_writes_replace_the_selection() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (tags, o) = select(&f, &t, "Tags", FieldType::MultiSelect, &["a", "b", "c"]);
    let rec = record(&f, &t);

    let stored = p
        .write_cell(Some(&f.owner), t.id, rec, tags.id, &json!([o[1].id, o[0].id, o[1].id]))
        .unwrap();
    assert_eq!(stored, Some(CellValue::MultiOption(vec![o[0].id, o[1].id])));

    let stored = p
        .write_cell(Some(&f.owner), t.id, rec, tags.id, &json!([o[2].id, o[1].id]))
        .unwrap();
    assert_eq!(stored, Some(CellValue::MultiOption(vec![o[1].id, o[2].id])));

    let stored = p
        .write_cell(Some(&f.owner), t.id, rec, tags.id, &json!([]))
        .unwrap();
    assert_eq!(stored, None);
}

#[test]
fn foreign_trashed_and_unknown_options_rejected() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (stage, stage_opts) = select(&f, &t, "Stage", FieldType::SingleSelect, &["Open", "Won"]);
    let (_, tag_opts) = select(&f, &t, "Tags", FieldType::MultiSelect, &["x"]);
    let rec = record(&f, &t);

    assert_kind(
        p.write_cell(Some(&f.owner), t.id, rec, stage.id, &json!(tag_opts[0].id)),
        ErrorKind::BadRequest,
    );
    assert_kind(
        p.write_cell(Some(&f.owner), t.id, rec, stage.id, &json!(9999)),
        ErrorKind::BadRequest,
    );
    assert_kind(
        p.write_cell(Some(&f.owner), t.id, rec, stage.id, &json!("open")),
        ErrorKind::BadRequest,
    );
    p.soft_delete(Some(&f.owner), EntityKind::SelectOption, stage_opts[1].id.get())
        .unwrap();
    assert_kind(
        p.write_cell(Some(&f.owner), t.id, rec, stage.id, &json!(stage_opts[1].id)),
        ErrorKind::BadRequest,
    );
}

// ── scalar cells ──────────────────────────────────────────────

#[test]
fn create_record_coerces_each_value() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let mk = |name: &str, ty: FieldType| {
        p.create_field(Some(&f.owner), t.id, name, ty, None).unwrap().0
    };
    let name = mk("Name", FieldType::Text);
    let amount = mk("Amount", FieldType::Currency);
    let done = mk("Done", FieldType::Checkbox);
    let due = mk("Due", FieldType::Date);
    let at = mk("Call at", FieldType::Time);

    let view = p
        .create_record(
            Some(&f.owner),
            t.id,
            &[
                (name.id, json!(42)),
                (amount.id, json!("12,5")),
                (done.id, json!("Sí")),
                (due.id, json!("2024-03-05T10:00:00Z")),
                (at.id, json!("09:30")),
            ],
        )
        .unwrap();

    let values: Vec<CellValue> = view.cells.into_iter().map(|c| c.value).collect();
    assert_eq!(
        values,
        vec![
            CellValue::Text("42".into()),
            CellValue::Number(12.5),
            CellValue::Bool(true),
            CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()),
            CellValue::Minutes(570),
        ]
    );
    assert_eq!(view.record.created_by, Some(f.owner.user_id));
}

#[test]
fn invalid_value_rolls_back_the_whole_record() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (amount, _) = p
        .create_field(Some(&f.owner), t.id, "Amount", FieldType::Number, None)
        .unwrap();
    assert_kind(
        p.create_record(Some(&f.owner), t.id, &[(amount.id, json!("lots"))]),
        ErrorKind::BadRequest,
    );
    assert!(p.list_records(Some(&f.owner), t.id).unwrap().is_empty());
}

#[test]
fn field_from_another_table_is_not_found() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let other = p.create_table(Some(&f.owner), f.base.id, "Other").unwrap();
    let (foreign, _) = p
        .create_field(Some(&f.owner), other.id, "Name", FieldType::Text, None)
        .unwrap();
    let rec = record(&f, &t);
    assert_kind(
        p.write_cell(Some(&f.owner), t.id, rec, foreign.id, &json!("x")),
        ErrorKind::NotFound,
    );
}

#[test]
fn blank_string_clears_non_text_cell() {
    let f = fixture();
    let p = &f.platform;
    let t = table(&f);
    let (amount, _) = p
        .create_field(Some(&f.owner), t.id, "Amount", FieldType::Number, None)
        .unwrap();
    let rec = record(&f, &t);
    p.write_cell(Some(&f.owner), t.id, rec, amount.id, &json!(3)).unwrap();
    assert_eq!(
        p.write_cell(Some(&f.owner), t.id, rec, amount.id, &json!("  ")).unwrap(),
        None
    );
    p.change_field_type(Some(&f.owner), amount.id, FieldType::Text, None)
        .unwrap();
}

#[test]
fn viewers_cannot_write_cells() {
    let f = fixture();
    f.grant(BaseRole::Viewer);
    let p = &f.platform;
    let t = table(&f);
    let (name, _) = p
        .create_field(Some(&f.owner), t.id, "Name", FieldType::Text, None)
        .unwrap();
    let rec = record(&f, &t);
    assert_kind(
        p.write_cell(Some(&f.member), t.id, rec, name.id, &json!("x")),
        ErrorKind::Forbidden,
    );
    assert_eq!(p.list_records(Some(&f.member), t.id).unwrap().len(), 1);
}
