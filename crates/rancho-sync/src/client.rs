//! HTTP client for the remote `catering.php` endpoint.
//!
//! Both directions share one [`reqwest::Client`] with a bounded timeout.  The
//! server's contract is deliberately narrow: success means a 2xx status with
//! a JSON-parseable body, anything else is a [`SyncError`].

use std::time::Duration;

use rancho_store::ReferenceUpdate;

use crate::error::{Result, SyncError};
use crate::protocol::{CatalogResponse, CheckinUpload};

/// Bearer header expected by the endpoint.
const AUTH_HEADER: &str = "X-Authorization";

/// Hard cap on any single request.  The device is expected to be on flaky
/// links; a hung call must not wedge the foreground operation forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrapper around [`reqwest::Client`] bound to one base URL.
pub struct SyncClient {
    http: reqwest::Client,
    base_url: String,
}

impl SyncClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/catering.php", self.base_url.trim_end_matches('/'))
    }

    /// Fetch every reference row that changed since `last_check`.
    pub async fn fetch_catalog(&self, token: &str, last_check: &str) -> Result<ReferenceUpdate> {
        let response = self
            .http
            .get(self.endpoint())
            .query(&[("last_check", last_check)])
            .header(AUTH_HEADER, token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "reference pull rejected");
            return Err(SyncError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let catalog: CatalogResponse =
            serde_json::from_str(&body).map_err(|e| SyncError::InvalidBody(e.to_string()))?;

        Ok(catalog.datos)
    }

    /// Upload one batch of pending check-ins.
    ///
    /// The body is the full JSON array; the server deduplicates on the
    /// client-generated ids, so retrying the identical batch is safe.
    pub async fn push_checkins(&self, token: &str, batch: &[CheckinUpload]) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint())
            .header(AUTH_HEADER, token)
            .json(batch)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "outbound sync rejected");
            return Err(SyncError::Status(status.as_u16()));
        }

        // The contract requires a JSON-parseable body even on success.
        let body = response.text().await?;
        serde_json::from_str::<serde_json::Value>(&body)
            .map_err(|e| SyncError::InvalidBody(e.to_string()))?;

        Ok(())
    }
}
