//! Outbound sync engine.
//!
//! Collects every pending check-in, uploads the whole set as one batch, and
//! flips exactly those records to synchronized once the server confirmed.
//! On any failure nothing is mutated: the batch is retried verbatim on the
//! next call and the server deduplicates on the client-generated ids.

use tokio::sync::Mutex;

use rancho_store::Database;

use crate::client::SyncClient;
use crate::error::{Result, SyncError};
use crate::protocol::CheckinUpload;
use crate::session::Session;

/// Result of a [`SyncEngine::sync_pending`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No pending records; no network call was made.
    NothingToSync,
    /// The server confirmed this many records.
    Synced(usize),
}

/// Uploads pending check-ins to the remote authority.
pub struct SyncEngine {
    client: SyncClient,
    /// Single-flight guard: at most one upload in progress.
    guard: Mutex<()>,
}

impl SyncEngine {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: SyncClient::new(base_url)?,
            guard: Mutex::new(()),
        })
    }

    /// Upload everything pending at the moment of the call.
    ///
    /// Records created while the upload is in flight are not part of the
    /// captured set and stay pending for the next call.
    pub async fn sync_pending(&self, session: &Session, db: &mut Database) -> Result<SyncOutcome> {
        let _flight = self.guard.try_lock().map_err(|_| SyncError::AlreadyRunning)?;

        let pending = db.pending_checkins()?;
        if pending.is_empty() {
            tracing::info!("nothing to sync");
            return Ok(SyncOutcome::NothingToSync);
        }

        tracing::info!(count = pending.len(), "uploading pending check-ins");

        let batch: Vec<CheckinUpload> = pending
            .iter()
            .map(|record| CheckinUpload::from_record(record, session.operator_id))
            .collect();

        self.client.push_checkins(&session.token, &batch).await?;

        // Only the records captured above flip; the server has confirmed
        // exactly this set.
        let ids: Vec<String> = pending.into_iter().map(|record| record.id).collect();
        db.mark_synchronized(&ids)?;

        tracing::info!(count = ids.len(), "outbound sync complete");
        Ok(SyncOutcome::Synced(ids.len()))
    }
}
