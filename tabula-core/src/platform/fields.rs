use super::tables::check_complete_order;
use super::{Platform, authorize, base_of, ensure_visible};
use crate::error::{DomainError, DomainResult};
use crate::lifecycle::ensure_active;
use crate::schema::{self, OptionInput, required_name};
use tabula_access::{Action, Actor};
use tabula_model::{AuditAction, AuditEvent, EntityKind, Field, FieldType, SelectOption};
use tabula_store::{fields, options, trash};
use tabula_types::{FieldId, OptionId, TableId};

impl Platform {
    /// Creates a field at the end of the table. Select types need `opts`.
    pub fn create_field(
        &self,
        actor: Option<&Actor>,
        table: TableId,
        name: &str,
        field_type: FieldType,
        opts: Option<&[OptionInput]>,
    ) -> DomainResult<(Field, Vec<SelectOption>)> {
        let now = self.now();
        let (ctx, base, created) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Table, table.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            let created = schema::create_field(tx, table, name, field_type, opts, now)?;
            Ok((ctx, base, created))
        })?;
        let field = &created.0;
        self.emit(
            AuditEvent::new(AuditAction::FieldCreated, format!("field {:?} created", field.name), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(table)
                .on_field(field.id)
                .with_details(serde_json::json!({
                    "type": field.field_type,
                    "options": created.1.len(),
                })),
        );
        Ok(created)
    }

    pub fn rename_field(&self, actor: Option<&Actor>, id: FieldId, name: &str) -> DomainResult<Field> {
        let name = required_name("field", name)?;
        let now = self.now();
        let (ctx, base, before, after) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Field, id.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            let field = fields::get(tx, id)?.ok_or_else(|| DomainError::not_found("field"))?;
            if !trash::rename_if_active(tx, EntityKind::Field, id.get(), &name, now)? {
                return Err(DomainError::in_trash("field"));
            }
            Ok((ctx, base, field.name.clone(), Field { name: name.clone(), ..field }))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::FieldRenamed, format!("field {before:?} renamed to {name:?}"), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(after.table_id)
                .on_field(id)
                .with_details(serde_json::json!({ "from": before, "to": name })),
        );
        Ok(after)
    }

    pub fn reorder_fields(
        &self,
        actor: Option<&Actor>,
        table: TableId,
        ordered: &[FieldId],
    ) -> DomainResult<Vec<Field>> {
        let ids: Vec<i64> = ordered.iter().map(|f| f.get()).collect();
        let now = self.now();
        let (ctx, base, list) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Table, table.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            ensure_active(tx, EntityKind::Table, table.get())?;
            check_complete_order(tx, EntityKind::Field, table.get(), &ids)?;
            trash::set_positions(tx, EntityKind::Field, &ids, 1)?;
            Ok((ctx, base, fields::list_active(tx, table)?))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::FieldsReordered, "fields reordered", now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(table)
                .with_details(serde_json::json!({ "order": ids })),
        );
        Ok(list)
    }

    pub fn list_fields(&self, actor: Option<&Actor>, table: TableId) -> DomainResult<Vec<Field>> {
        self.store.read(|conn| {
            let base = base_of(conn, EntityKind::Table, table.get())?;
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Table, table.get())?;
            Ok(fields::list_active(conn, table)?)
        })
    }

    /// Changes a field's type; see [`schema::change_field_type`].
    pub fn change_field_type(
        &self,
        actor: Option<&Actor>,
        id: FieldId,
        new_type: FieldType,
        opts: Option<&[OptionInput]>,
    ) -> DomainResult<Field> {
        let now = self.now();
        let (ctx, base, old_type, field) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Field, id.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            let old_type = fields::get(tx, id)?
                .ok_or_else(|| DomainError::not_found("field"))?
                .field_type;
            let field = schema::change_field_type(tx, id, new_type, opts, now)?;
            Ok((ctx, base, old_type, field))
        })?;
        if old_type != new_type {
            self.emit(
                AuditEvent::new(
                    AuditAction::FieldTypeChanged,
                    format!("field {:?} changed from {old_type} to {new_type}", field.name),
                    now,
                )
                .by(ctx.actor.user_id)
                .in_base(base)
                .in_table(field.table_id)
                .on_field(id)
                .with_details(serde_json::json!({ "from": old_type, "to": new_type })),
            );
        }
        Ok(field)
    }

    // ── options ──────────────────────────────────────────────

    pub fn add_option(
        &self,
        actor: Option<&Actor>,
        field: FieldId,
        label: &str,
        color: Option<&str>,
    ) -> DomainResult<SelectOption> {
        let now = self.now();
        let (ctx, base, option) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::Field, field.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            ensure_active(tx, EntityKind::Field, field.get())?;
            let def = fields::get(tx, field)?.ok_or_else(|| DomainError::not_found("field"))?;
            if !def.field_type.is_select() {
                return Err(DomainError::bad_request(format!(
                    "{} fields do not take options",
                    def.field_type
                )));
            }
            let input = OptionInput {
                label: label.to_string(),
                color: color.map(str::to_string),
            };
            let mut created = schema::append_options(tx, field, &[input], now)?;
            let option = created.pop().ok_or_else(DomainError::internal)?;
            Ok((ctx, base, option))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::OptionCreated, format!("option {:?} added", option.label), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .on_field(field)
                .with_details(serde_json::json!({ "option_id": option.id })),
        );
        Ok(option)
    }

    /// Updates an option's label and/or color. `color: Some(None)` clears it.
    pub fn update_option(
        &self,
        actor: Option<&Actor>,
        id: OptionId,
        label: Option<&str>,
        color: Option<Option<&str>>,
    ) -> DomainResult<SelectOption> {
        let label = label.map(|l| required_name("option", l)).transpose()?;
        let now = self.now();
        let (ctx, base, option) = self.store.transaction(|tx| -> DomainResult<_> {
            let base = base_of(tx, EntityKind::SelectOption, id.get())?;
            let ctx = authorize(tx, actor, base, Action::SchemaManage)?;
            if options::get(tx, id)?.is_none() {
                return Err(DomainError::not_found("option"));
            }
            if !options::update_if_active(tx, id, label.as_deref(), color, now)? {
                return Err(DomainError::in_trash("option"));
            }
            let option = options::get(tx, id)?.ok_or_else(|| DomainError::not_found("option"))?;
            Ok((ctx, base, option))
        })?;
        self.emit(
            AuditEvent::new(AuditAction::OptionUpdated, format!("option {:?} updated", option.label), now)
                .by(ctx.actor.user_id)
                .in_base(base)
                .on_field(option.field_id)
                .with_details(serde_json::json!({ "option_id": id, "color": option.color })),
        );
        Ok(option)
    }

    pub fn list_options(&self, actor: Option<&Actor>, field: FieldId) -> DomainResult<Vec<SelectOption>> {
        self.store.read(|conn| {
            let base = base_of(conn, EntityKind::Field, field.get())?;
            authorize(conn, actor, base, Action::RecordsRead)?;
            ensure_visible(conn, EntityKind::Field, field.get())?;
            Ok(options::list_active(conn, field)?)
        })
    }
}
