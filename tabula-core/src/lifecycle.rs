//! Trash lifecycle: soft delete, restore, permanent delete and purge.
//!
//! One engine serves every [`EntityKind`]. Cascades follow
//! [`EntityKind::cascade_children`]; the only per-kind behaviour is the
//! cell cleanup for fields and options and the select-type check when
//! options come back.
//!
//! These functions run inside a caller-supplied transaction and never check
//! who is asking. Authorization lives in [`crate::Platform`].

use crate::config::TrashConfig;
use crate::error::{DomainError, DomainResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tabula_model::{EntityKind, NameRule};
use tabula_store::trash::{self, TrashScope};
use tabula_store::{StoreError, cells, fields, with_savepoint};
use tabula_types::{FieldId, OptionId};
use tracing::{debug, info, warn};

/// One row touched by a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: i64) -> Self {
        Self { kind, id }
    }
}

/// Outcome of a restore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restored {
    pub entity: EntityRef,
    /// Every row restored, the target first.
    pub restored: Vec<EntityRef>,
    /// Rows that came back under a new name, with that name.
    pub renamed: Vec<(EntityRef, String)>,
}

impl Restored {
    /// The target's new name if it had to be renamed.
    pub fn new_name(&self) -> Option<&str> {
        self.renamed
            .iter()
            .find(|(e, _)| *e == self.entity)
            .map(|(_, name)| name.as_str())
    }
}

/// Rows removed per kind by a purge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub removed: Vec<(EntityKind, usize)>,
}

impl PurgeReport {
    pub fn total(&self) -> usize {
        self.removed.iter().map(|(_, n)| n).sum()
    }
}

fn require_state(conn: &Connection, kind: EntityKind, id: i64) -> DomainResult<bool> {
    trash::state(conn, kind, id)?
        .map(|s| s.is_trashed())
        .ok_or_else(|| DomainError::not_found(kind.as_str()))
}

/// Fails with `Conflict` unless the row and all its ancestors are active.
pub fn ensure_active(conn: &Connection, kind: EntityKind, id: i64) -> DomainResult<()> {
    if trash::is_active_chain(conn, kind, id)? {
        Ok(())
    } else {
        Err(DomainError::in_trash(kind.as_str()))
    }
}

/// Trashes an entity and everything its kind cascades to.
///
/// Already-trashed rows are left untouched and yield an empty list.
pub fn soft_delete(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
) -> DomainResult<Vec<EntityRef>> {
    if require_state(conn, kind, id)? {
        debug!("{kind} {id} already in trash");
        return Ok(Vec::new());
    }

    let mut trashed = Vec::new();
    trash_cascade(conn, kind, id, at, &mut trashed)?;

    if kind.is_positioned() {
        if let Some(parent) = trash::parent_of(conn, kind, id)? {
            compact(conn, kind, parent)?;
        }
    }

    debug!("trashed {kind} {id} ({} rows)", trashed.len());
    Ok(trashed)
}

fn trash_cascade(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
    trashed: &mut Vec<EntityRef>,
) -> DomainResult<()> {
    if !trash::mark_trashed(conn, kind, id, at)? {
        return Ok(());
    }
    trashed.push(EntityRef::new(kind, id));

    match kind {
        EntityKind::Field => {
            let cleared = cells::clear_field(conn, FieldId::new(id), at)?;
            debug!("cleared {cleared} cells of field {id}");
        }
        EntityKind::SelectOption => {
            cells::clear_option_references(conn, OptionId::new(id), at)?;
        }
        _ => {}
    }

    for edge in kind.cascade_children() {
        for child in trash::child_ids(conn, edge.child, edge.foreign_key, id, false)? {
            trash_cascade(conn, edge.child, child, at, trashed)?;
        }
    }
    Ok(())
}

/// Rewrites positions of the active siblings under `parent` to `1..N`.
pub fn compact(conn: &Connection, kind: EntityKind, parent: i64) -> DomainResult<()> {
    let ids = trash::active_siblings(conn, kind, parent)?;
    trash::set_positions(conn, kind, &ids, 1)?;
    Ok(())
}

/// Brings an entity and its trashed descendants back.
///
/// Name collisions with active siblings are resolved by renaming the
/// restored row to `"{name} (restored {timestamp})"`, then `… #2`, `… #3`
/// and so on.
pub fn restore(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
    config: &TrashConfig,
) -> DomainResult<Restored> {
    if !require_state(conn, kind, id)? {
        return Err(DomainError::conflict(format!("{kind} is not in trash")));
    }
    if let Some((parent_kind, _)) = trash::trashed_ancestor(conn, kind, id)? {
        return Err(DomainError::conflict(format!(
            "{parent_kind} containing this {kind} is in trash, restore it first"
        )));
    }
    if kind == EntityKind::SelectOption {
        let field = trash::parent_of(conn, kind, id)?
            .ok_or_else(|| DomainError::not_found("field"))?;
        if !field_uses_options(conn, field)? {
            return Err(DomainError::conflict("field no longer uses options"));
        }
    }

    let start = match (kind.is_positioned(), trash::parent_of(conn, kind, id)?) {
        (true, Some(parent)) => Some(trash::next_position(conn, kind, parent)?),
        _ => None,
    };

    let mut out = Restored {
        entity: EntityRef::new(kind, id),
        restored: Vec::new(),
        renamed: Vec::new(),
    };
    restore_cascade(conn, kind, id, at, config, &mut out)?;
    if let Some(start) = start {
        trash::set_positions(conn, kind, &[id], start)?;
    }

    debug!(
        "restored {kind} {id} ({} rows, {} renamed)",
        out.restored.len(),
        out.renamed.len()
    );
    Ok(out)
}

fn field_uses_options(conn: &Connection, field: i64) -> DomainResult<bool> {
    Ok(fields::get(conn, FieldId::new(field))?
        .map(|f| f.field_type.is_select())
        .unwrap_or(false))
}

fn restore_cascade(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
    config: &TrashConfig,
    out: &mut Restored,
) -> DomainResult<()> {
    if let Some(name) = restore_row(conn, kind, id, at, config)? {
        out.renamed.push((EntityRef::new(kind, id), name));
    }
    out.restored.push(EntityRef::new(kind, id));

    for edge in kind.cascade_children() {
        if edge.child == EntityKind::SelectOption && !field_uses_options(conn, id)? {
            continue;
        }
        let children = trash::child_ids(conn, edge.child, edge.foreign_key, id, true)?;
        if children.is_empty() {
            continue;
        }
        let start = if edge.child.is_positioned() {
            Some(trash::next_position(conn, edge.child, id)?)
        } else {
            None
        };
        for &child in &children {
            restore_cascade(conn, edge.child, child, at, config, out)?;
        }
        if let Some(start) = start {
            trash::set_positions(conn, edge.child, &children, start)?;
        }
    }
    Ok(())
}

/// Clears the trash flag on one row, renaming on collision.
/// Returns the new name when one was needed.
fn restore_row(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    at: DateTime<Utc>,
    config: &TrashConfig,
) -> DomainResult<Option<String>> {
    if kind.name_rule() == NameRule::Unnamed {
        trash::mark_restored(conn, kind, id, at)?;
        return Ok(None);
    }

    match with_savepoint(conn, "restore_row", |c| trash::mark_restored(c, kind, id, at)) {
        Ok(_) => return Ok(None),
        Err(e) if e.is_unique_violation() => {}
        Err(e) => return Err(e.into()),
    }

    let original = trash::name_of(conn, kind, id)?.unwrap_or_default();
    let stem = format!(
        "{original} (restored {})",
        restored_timestamp(at, &config.restored_timestamp_format)
    );
    // Every taken candidate belongs to a distinct active sibling, so this ends.
    let mut attempt: u64 = 1;
    loop {
        let candidate = if attempt == 1 {
            stem.clone()
        } else {
            format!("{stem} #{attempt}")
        };
        let result = with_savepoint(conn, "restore_rename", |c| {
            trash::mark_restored_as(c, kind, id, &candidate, at)
        });
        match result {
            Ok(_) => {
                warn!("{kind} {id} restored as {candidate:?}, {original:?} was taken");
                return Ok(Some(candidate));
            }
            Err(StoreError::UniqueViolation { .. }) => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Formats `at` with `format`, falling back to the default layout when the
/// pattern is not a valid strftime string.
fn restored_timestamp(at: DateTime<Utc>, format: &str) -> String {
    const FALLBACK: &str = "%Y-%m-%d %H:%M:%S";
    let valid = !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    at.format(if valid { format } else { FALLBACK }).to_string()
}

/// Hard-deletes a trashed entity; foreign keys remove its descendants.
pub fn delete_permanently(conn: &Connection, kind: EntityKind, id: i64) -> DomainResult<()> {
    if !require_state(conn, kind, id)? {
        return Err(DomainError::conflict(format!("{kind} is not in trash")));
    }
    trash::delete_row(conn, kind, id)?;
    debug!("deleted {kind} {id} permanently");
    Ok(())
}

/// Hard-deletes every trashed row of `kind` within `scope`.
pub fn empty_trash(conn: &Connection, kind: EntityKind, scope: TrashScope) -> DomainResult<usize> {
    if matches!(scope, TrashScope::Parent(_)) && kind.parent().is_none() {
        return Err(DomainError::bad_request(format!(
            "{kind} trash can only be emptied per owner"
        )));
    }
    let removed = trash::delete_trashed_in(conn, kind, scope)?;
    info!("emptied {removed} {kind} rows from trash ({scope:?})");
    Ok(removed)
}

/// Hard-deletes trashed rows of `kind` trashed at least `days` ago.
pub fn purge_older_than(
    conn: &Connection,
    kind: EntityKind,
    days: u32,
    now: DateTime<Utc>,
) -> DomainResult<usize> {
    let Some(threshold) =
        Duration::try_days(i64::from(days)).and_then(|age| now.checked_sub_signed(age))
    else {
        debug!("no {kind} row can be trashed more than {days} days ago");
        return Ok(0);
    };
    let removed = trash::delete_trashed_before(conn, kind, threshold)?;
    info!("purged {removed} {kind} rows trashed before {threshold}");
    Ok(removed)
}

/// [`purge_older_than`] for every kind, descendants first.
pub fn purge_all_older_than(
    conn: &Connection,
    days: u32,
    now: DateTime<Utc>,
) -> DomainResult<PurgeReport> {
    let mut report = PurgeReport::default();
    for kind in EntityKind::PURGE_ORDER {
        let n = purge_older_than(conn, kind, days, now)?;
        report.removed.push((kind, n));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn restored_timestamp_uses_configured_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(restored_timestamp(at, "%Y-%m-%d %H:%M:%S"), "2024-01-01 12:00:00");
        assert_eq!(restored_timestamp(at, "%d/%m/%Y"), "01/01/2024");
    }

    #[test]
    fn invalid_format_falls_back() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(restored_timestamp(at, "%Y %"), "2024-01-01 12:00:00");
    }

    #[test]
    fn purge_age_beyond_calendar_is_a_noop() {
        let store = tabula_store::Store::open_in_memory().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let removed = store
            .transaction(|conn| purge_older_than(conn, EntityKind::Table, u32::MAX, now))
            .unwrap();
        assert_eq!(removed, 0);
        let removed = store
            .transaction(|conn| purge_older_than(conn, EntityKind::Table, 0, now))
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn purge_report_total() {
        let report = PurgeReport {
            removed: vec![(EntityKind::Record, 3), (EntityKind::Table, 2)],
        };
        assert_eq!(report.total(), 5);
    }
}
