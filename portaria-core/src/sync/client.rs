//! HTTP client for the spreadsheet webhook.

use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;

use super::error::SyncError;
use super::payload::PushPayload;
use super::snapshot::Snapshot;
use super::timer::DEFAULT_REFRESH_DELAY;
use crate::format::now_br;
use crate::models::VisitorRecord;

/// Result of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// No webhook configured; nothing was sent.
    Disabled,
    /// The request went out. A follow-up pull is due after `refresh_after`.
    Dispatched { refresh_after: Duration },
}

/// Client for the spreadsheet webhook.
///
/// Without a webhook URL every call is a no-op, which is how the front desk
/// runs fully offline.
#[derive(Debug, Clone)]
pub struct CloudClient {
    webhook_url: Option<String>,
    refresh_delay: Duration,
    http: reqwest::Client,
}

impl CloudClient {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url: webhook_url.filter(|u| !u.trim().is_empty()),
            refresh_delay: DEFAULT_REFRESH_DELAY,
            http: reqwest::Client::new(),
        }
    }

    /// A client with sync switched off.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    pub fn refresh_delay(&self) -> Duration {
        self.refresh_delay
    }

    /// Fetches the full sheet.
    ///
    /// Returns `Ok(None)` when sync is disabled.
    pub async fn pull_snapshot(&self) -> Result<Option<Snapshot>, SyncError> {
        let Some(webhook_url) = self.webhook_url.as_deref() else {
            return Ok(None);
        };

        let url = build_pull_url(webhook_url, Utc::now().timestamp_millis());
        tracing::debug!("Pulling snapshot from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::HttpStatus(response.status().as_u16()));
        }

        let snapshot = response
            .json::<Snapshot>()
            .await
            .map_err(|e| SyncError::InvalidResponse(e.to_string()))?;

        Ok(Some(snapshot))
    }

    /// Sends the record's current state as one row append.
    ///
    /// Only transport failures are reported; whatever the script answers is
    /// ignored.
    pub async fn push_event(&self, record: &VisitorRecord) -> Result<PushOutcome, SyncError> {
        let Some(webhook_url) = self.webhook_url.as_deref() else {
            return Ok(PushOutcome::Disabled);
        };

        let payload = PushPayload::from_record(record, &now_br());
        let body =
            serde_json::to_string(&payload).map_err(|e| SyncError::EncodeError(e.to_string()))?;

        let response = self
            .http
            .post(webhook_url)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::ConnectionError(e.to_string()))?;

        tracing::debug!(
            "Pushed {:?} for {} (webhook answered {})",
            payload.action,
            record.id,
            response.status()
        );

        Ok(PushOutcome::Dispatched {
            refresh_after: self.refresh_delay,
        })
    }
}

/// Appends the cache-busting `t` parameter to the webhook URL.
fn build_pull_url(webhook_url: &str, millis: i64) -> String {
    let separator = if webhook_url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", webhook_url, separator, millis)
}
