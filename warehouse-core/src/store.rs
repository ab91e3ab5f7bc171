//! SQLite-backed warehouse tables.
//!
//! Every writer borrows the one connection opened for the batch and commits
//! its own statement or transaction, so earlier cities stay persisted when a
//! later one fails.

use std::{fs, path::Path};

use rusqlite::Connection;

use crate::error::{EtlError, Result};

pub mod dimension;
pub mod facts;
pub mod schema;

pub use dimension::DimensionCatalog;
pub use facts::{HistoryAppender, HistoryRow, SnapshotRow, SnapshotUpserter};
pub use schema::SchemaProvisioner;

/// Open (or create) the warehouse database file.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path).map_err(EtlError::Store)?;
    configure(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(EtlError::Store)?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(EtlError::Store)
}
