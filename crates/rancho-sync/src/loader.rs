//! Reference data loader.
//!
//! Pulls everything that changed since the last successful pull and lands it
//! in the local store.  The watermark only advances when the whole batch
//! committed, so a failed pull is re-requested in full on the next attempt
//! and the store's idempotent upserts absorb the redelivery.

use chrono::Local;
use tokio::sync::Mutex;

use rancho_store::Database;

use crate::client::SyncClient;
use crate::error::{Result, SyncError};
use crate::session::Session;

/// Result of a [`ReferenceLoader::pull`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// No session: nothing was requested.  This is the expected state before
    /// login, not a failure.
    NotLoggedIn,
    /// The pull succeeded; `rows` reference rows were applied.
    Applied { rows: usize },
}

/// Pulls incremental reference data into the local store.
pub struct ReferenceLoader {
    client: SyncClient,
    /// Single-flight guard: at most one pull in progress.
    guard: Mutex<()>,
}

impl ReferenceLoader {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: SyncClient::new(base_url)?,
            guard: Mutex::new(()),
        })
    }

    /// Run one incremental pull.
    ///
    /// Without a session the call logs and returns [`PullOutcome::NotLoggedIn`]
    /// -- being logged out is a steady state, not an error.  Any network or
    /// store failure propagates and leaves the watermark untouched.
    pub async fn pull(&self, session: Option<&Session>, db: &mut Database) -> Result<PullOutcome> {
        let _flight = self.guard.try_lock().map_err(|_| SyncError::AlreadyRunning)?;

        let Some(session) = session else {
            tracing::info!("no active session, skipping reference pull");
            return Ok(PullOutcome::NotLoggedIn);
        };

        let since = db.last_sync_watermark()?;
        tracing::info!(%since, "starting reference pull");

        let update = self.client.fetch_catalog(&session.token, &since).await?;

        // The watermark is the local wall-clock at the moment the pull
        // succeeded; it commits atomically with the rows.
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        db.apply_reference_update(&update, &now)?;

        let rows = update.row_count();
        tracing::info!(rows, watermark = %now, "reference pull complete");
        Ok(PullOutcome::Applied { rows })
    }
}
