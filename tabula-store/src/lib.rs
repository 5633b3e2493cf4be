//! SQLite entity store for Tabula.
//!
//! Provides the transactional relational store the domain layer runs on:
//! unique constraints per (parent, name) among active rows, cascading
//! foreign keys, and multi-statement transactions.
//!
//! # Architecture
//!
//! - One writer connection guarded by a mutex; every transaction is opened
//!   `BEGIN IMMEDIATE` so read-then-write sequences are serialized
//! - Repositories are free functions over `&Connection`, usable both inside
//!   [`Store::transaction`] and [`Store::read`]
//! - [`trash`] holds the kind-generic soft-delete row operations
//! - SQLite constraint failures surface as [`StoreError::UniqueViolation`]
//!   and friends rather than raw error codes

mod codec;
mod error;
mod schema;

pub mod audit;
pub mod bases;
pub mod cells;
pub mod comments;
pub mod fields;
pub mod members;
pub mod options;
pub mod records;
pub mod tables;
pub mod trash;
pub mod users;
pub mod workspaces;

pub use codec::{format_date, format_ts, parse_date, parse_ts};
pub use error::{StoreError, StoreResult};
pub use schema::SCHEMA_VERSION;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Connection tuning.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long a writer waits on a locked database file.
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Handle to the entity store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        Self::open_with(path, &StoreOptions::default())
    }

    /// Opens (or creates) a store at the given path with explicit options.
    pub fn open_with(path: &Path, options: &StoreOptions) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        // journal_mode answers with a row, so it cannot go through execute.
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!("opened store at {} (journal_mode={mode})", path.display());
        Self::init(conn, options)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, &StoreOptions::default())
    }

    fn init(conn: Connection, options: &StoreOptions) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.busy_timeout(options.busy_timeout)?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Runs `f` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls everything back otherwise, so a
    /// failed cascade never leaves partial state behind.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let out = f(&tx)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(out)
    }

    /// Runs read-only work against the connection.
    pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<StoreError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }
}

/// Runs `f` inside a savepoint, rolling back only `f`'s writes on error.
///
/// Lets a transaction attempt a write that may hit a unique index and carry
/// on with a different candidate afterwards.
pub fn with_savepoint<T>(
    conn: &Connection,
    name: &str,
    f: impl FnOnce(&Connection) -> StoreResult<T>,
) -> StoreResult<T> {
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(value)
        }
        Err(err) => {
            conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))?;
            Err(err)
        }
    }
}
