//! Sync metadata: the incremental-pull watermark.
//!
//! The watermark lives in the `sync_meta` key-value table so that advancing
//! it is atomic with the reference rows of the same pull.

use rusqlite::{params, Connection, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

const LAST_CHECK_KEY: &str = "last_check";

/// Watermark returned when no pull has ever succeeded.  Far enough in the
/// past that the first pull requests the full catalog.
pub const EPOCH_WATERMARK: &str = "1970-01-01";

impl Database {
    /// Timestamp of the last successful reference pull, or
    /// [`EPOCH_WATERMARK`] if none has been recorded.
    pub fn last_sync_watermark(&self) -> Result<String> {
        let value: Option<String> = self
            .conn()
            .query_row(
                "SELECT value FROM sync_meta WHERE key = ?1",
                params![LAST_CHECK_KEY],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value.unwrap_or_else(|| EPOCH_WATERMARK.to_string()))
    }
}

/// Persist the watermark inside an already-open transaction.
///
/// Called by the reference loader as the last statement of a pull, so the
/// watermark only moves when every row of the pull committed.
pub(crate) fn set_watermark(conn: &Connection, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![LAST_CHECK_KEY, value],
    )?;
    Ok(())
}
