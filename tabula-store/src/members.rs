//! Base membership rows.

use crate::codec::{enum_at, format_ts, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{BaseMember, BaseRole};
use tabula_types::{BaseId, UserId};

fn from_row(row: &Row<'_>) -> rusqlite::Result<BaseMember> {
    Ok(BaseMember {
        base_id: BaseId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        role: enum_at(row, 2)?,
        created_at: ts_at(row, 3)?,
    })
}

pub fn insert(
    conn: &Connection,
    base: BaseId,
    user: UserId,
    role: BaseRole,
    at: DateTime<Utc>,
) -> StoreResult<BaseMember> {
    conn.execute(
        "INSERT INTO base_members (base_id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![base.get(), user.get(), role.as_str(), format_ts(at)],
    )?;
    Ok(BaseMember {
        base_id: base,
        user_id: user,
        role,
        created_at: at,
    })
}

pub fn role(conn: &Connection, base: BaseId, user: UserId) -> StoreResult<Option<BaseRole>> {
    let role = conn
        .query_row(
            "SELECT role FROM base_members WHERE base_id = ?1 AND user_id = ?2",
            params![base.get(), user.get()],
            |row| enum_at::<BaseRole>(row, 0),
        )
        .optional()?;
    Ok(role)
}

pub fn update_role(conn: &Connection, base: BaseId, user: UserId, role: BaseRole) -> StoreResult<bool> {
    let n = conn.execute(
        "UPDATE base_members SET role = ?3 WHERE base_id = ?1 AND user_id = ?2",
        params![base.get(), user.get(), role.as_str()],
    )?;
    Ok(n > 0)
}

pub fn delete(conn: &Connection, base: BaseId, user: UserId) -> StoreResult<bool> {
    let n = conn.execute(
        "DELETE FROM base_members WHERE base_id = ?1 AND user_id = ?2",
        params![base.get(), user.get()],
    )?;
    Ok(n > 0)
}

pub fn list(conn: &Connection, base: BaseId) -> StoreResult<Vec<BaseMember>> {
    let mut stmt = conn.prepare(
        "SELECT base_id, user_id, role, created_at FROM base_members
         WHERE base_id = ?1 ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map(params![base.get()], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
