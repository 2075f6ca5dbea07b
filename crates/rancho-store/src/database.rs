//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.
//!
//! Every writing operation takes `&mut self` and runs inside an explicit
//! `rusqlite` transaction, so a logical operation either commits all of its
//! statements or none of them.  The `&mut` receiver also makes the
//! single-writer model structural: callers that share a handle across tasks
//! must serialize on whatever owns the `Database`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/rancho/rancho.db`
    /// - macOS:   `~/Library/Application Support/com.rancho.rancho/rancho.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\rancho\rancho\data\rancho.db`
    pub fn new() -> Result<Self> {
        let db_path = Self::default_path()?;

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for embedding the store inside custom
    /// directory layouts.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Run schema migrations.
        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Delete the database at `path` and reopen it with a fresh schema.
    ///
    /// This is the explicit, opt-in "start clean" operation.  It erases all
    /// local history, including check-ins that were never synchronized, so it
    /// must only run after the operator confirms.  It is never invoked as a
    /// startup side effect.
    pub fn reset_at(path: &Path) -> Result<Self> {
        tracing::warn!(path = %path.display(), "resetting local database");

        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.as_os_str().to_owned();
            file.push(suffix);
            match std::fs::remove_file(PathBuf::from(file)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io(e)),
            }
        }

        Self::open_at(path)
    }

    /// Resolve the per-install database path.
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "rancho", "rancho").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("rancho.db"))
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return a mutable reference to the underlying connection.
    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
