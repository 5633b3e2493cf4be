//! Table definitions and startup migrations.
//!
//! Uniqueness among active siblings is enforced by partial unique indexes
//! (`WHERE is_trashed = 0`) so trashed rows never block a new name. Names
//! compare `NOCASE`. Every trashable table carries a CHECK tying
//! `is_trashed` to `trashed_at`.

use crate::error::{StoreError, StoreResult};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA_V1: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        platform_role TEXT NOT NULL DEFAULT 'USER'
            CHECK (platform_role IN ('USER', 'SYSADMIN')),
        can_create_bases INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS workspaces (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );
    CREATE UNIQUE INDEX IF NOT EXISTS ux_workspaces_owner_name
        ON workspaces(owner_id, name COLLATE NOCASE) WHERE is_trashed = 0;

    CREATE TABLE IF NOT EXISTS bases (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        visibility TEXT NOT NULL DEFAULT 'PRIVATE'
            CHECK (visibility IN ('PUBLIC', 'PRIVATE')),
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );
    CREATE UNIQUE INDEX IF NOT EXISTS ux_bases_owner_name
        ON bases(owner_id, name COLLATE NOCASE) WHERE is_trashed = 0;
    CREATE INDEX IF NOT EXISTS idx_bases_workspace ON bases(workspace_id);

    CREATE TABLE IF NOT EXISTS base_members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base_id INTEGER NOT NULL REFERENCES bases(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('VIEWER', 'COMMENTER', 'EDITOR')),
        created_at TEXT NOT NULL,
        UNIQUE(base_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS table_defs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        base_id INTEGER NOT NULL REFERENCES bases(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        position INTEGER NOT NULL,
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );
    CREATE UNIQUE INDEX IF NOT EXISTS ux_table_defs_base_name
        ON table_defs(base_id, name COLLATE NOCASE) WHERE is_trashed = 0;

    CREATE TABLE IF NOT EXISTS fields (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_id INTEGER NOT NULL REFERENCES table_defs(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        field_type TEXT NOT NULL,
        position INTEGER NOT NULL,
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );
    CREATE UNIQUE INDEX IF NOT EXISTS ux_fields_table_name
        ON fields(table_id, name COLLATE NOCASE) WHERE is_trashed = 0;

    CREATE TABLE IF NOT EXISTS select_options (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        field_id INTEGER NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
        label TEXT NOT NULL,
        color TEXT,
        position INTEGER NOT NULL,
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );
    CREATE UNIQUE INDEX IF NOT EXISTS ux_select_options_field_label
        ON select_options(field_id, label COLLATE NOCASE) WHERE is_trashed = 0;

    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        table_id INTEGER NOT NULL REFERENCES table_defs(id) ON DELETE CASCADE,
        created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );
    CREATE INDEX IF NOT EXISTS idx_records_table ON records(table_id);

    CREATE TABLE IF NOT EXISTS record_cells (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        record_id INTEGER NOT NULL REFERENCES records(id) ON DELETE CASCADE,
        field_id INTEGER NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
        string_value TEXT,
        number_value REAL,
        bool_value INTEGER,
        date_value TEXT,
        datetime_value TEXT,
        time_minutes INTEGER CHECK (time_minutes IS NULL OR time_minutes BETWEEN 0 AND 1439),
        select_option_id INTEGER REFERENCES select_options(id) ON DELETE SET NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(record_id, field_id)
    );
    CREATE INDEX IF NOT EXISTS idx_record_cells_field ON record_cells(field_id);

    CREATE TABLE IF NOT EXISTS record_cell_options (
        record_cell_id INTEGER NOT NULL REFERENCES record_cells(id) ON DELETE CASCADE,
        option_id INTEGER NOT NULL REFERENCES select_options(id) ON DELETE CASCADE,
        PRIMARY KEY (record_cell_id, option_id)
    );

    CREATE TABLE IF NOT EXISTS comments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        record_id INTEGER NOT NULL REFERENCES records(id) ON DELETE CASCADE,
        author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        body TEXT NOT NULL,
        is_trashed INTEGER NOT NULL DEFAULT 0,
        trashed_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK ((is_trashed = 0 AND trashed_at IS NULL) OR (is_trashed = 1 AND trashed_at IS NOT NULL))
    );

    CREATE TABLE IF NOT EXISTS audit_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id TEXT NOT NULL UNIQUE,
        base_id INTEGER,
        table_id INTEGER,
        record_id INTEGER,
        field_id INTEGER,
        user_id INTEGER,
        action TEXT NOT NULL,
        summary TEXT NOT NULL,
        details TEXT NOT NULL,
        ip_address TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_audit_events_base ON audit_events(base_id, id);
";

/// Brings the schema up to [`SCHEMA_VERSION`].
pub(crate) fn migrate(conn: &Connection) -> StoreResult<()> {
    let current: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StoreError::Migration(format!("failed to read schema version: {e}")))?;

    if current > SCHEMA_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than supported v{SCHEMA_VERSION}"
        )));
    }
    if current == SCHEMA_VERSION {
        debug!("schema up to date (v{current})");
        return Ok(());
    }

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| StoreError::Migration(format!("failed to apply schema v1: {e}")))?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|e| StoreError::Migration(format!("failed to record schema version: {e}")))?;
    info!("migrated schema v{current} -> v{SCHEMA_VERSION}");
    Ok(())
}
