//! User rows.

use crate::codec::{enum_at, format_ts, ts_at};
use crate::error::StoreResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tabula_model::{PlatformRole, User};
use tabula_types::UserId;

const COLUMNS: &str = "id, email, display_name, platform_role, can_create_bases, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        email: row.get(1)?,
        display_name: row.get(2)?,
        platform_role: enum_at(row, 3)?,
        can_create_bases: row.get(4)?,
        created_at: ts_at(row, 5)?,
    })
}

pub fn insert(
    conn: &Connection,
    email: &str,
    display_name: &str,
    platform_role: PlatformRole,
    can_create_bases: bool,
    at: DateTime<Utc>,
) -> StoreResult<User> {
    conn.execute(
        "INSERT INTO users (email, display_name, platform_role, can_create_bases, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            email,
            display_name,
            platform_role.as_str(),
            can_create_bases,
            format_ts(at)
        ],
    )?;
    Ok(User {
        id: UserId::new(conn.last_insert_rowid()),
        email: email.to_string(),
        display_name: display_name.to_string(),
        platform_role,
        can_create_bases,
        created_at: at,
    })
}

pub fn get(conn: &Connection, id: UserId) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id.get()], from_row).optional()?)
}

pub fn find_by_email(conn: &Connection, email: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {COLUMNS} FROM users WHERE email = ?1");
    Ok(conn.query_row(&sql, params![email], from_row).optional()?)
}

pub fn set_platform_role(conn: &Connection, id: UserId, role: PlatformRole) -> StoreResult<bool> {
    let n = conn.execute(
        "UPDATE users SET platform_role = ?2 WHERE id = ?1",
        params![id.get(), role.as_str()],
    )?;
    Ok(n > 0)
}

pub fn set_can_create_bases(conn: &Connection, id: UserId, allowed: bool) -> StoreResult<bool> {
    let n = conn.execute(
        "UPDATE users SET can_create_bases = ?2 WHERE id = ?1",
        params![id.get(), allowed],
    )?;
    Ok(n > 0)
}
