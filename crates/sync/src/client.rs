// SPDX-License-Identifier: MIT

//! Remote push client.
//!
//! Sends one record at a time to the remote system's per-model upsert
//! endpoint (`POST {base}/sync/{model}`), authenticated with a bearer
//! credential. The endpoint is an idempotent upsert keyed by record id
//! (create if absent, overwrite if present), which is what makes
//! engine-level "push again" safe after a partial failure.
//!
//! The client never retries internally; retry is the scheduler's
//! responsibility via the next pass.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use till_core::{Model, Record};

use crate::config::SyncConfig;

/// Error type for a single push attempt.
///
/// Non-success status, transport failure, and decode failure are all
/// uniform push failures; callers only need the message.
#[derive(Debug, Error)]
pub enum PushError {
    /// The remote endpoint is not configured.
    #[error("remote sync is not configured: {0}")]
    NotConfigured(&'static str),

    /// Transport-level failure (DNS, connect, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The remote answered with a non-success status.
    #[error("remote rejected record ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The success response did not acknowledge the pushed record.
    #[error("invalid acknowledgement: {0}")]
    BadAck(String),
}

/// Seam between the replication engine and the remote system.
///
/// Production uses [`HttpPushClient`]; tests inject mocks.
#[async_trait]
pub trait PushClient: Send + Sync {
    /// Push one record to the remote upsert endpoint.
    async fn push(&self, record: &Record) -> Result<(), PushError>;
}

/// Success response from the remote upsert endpoint.
#[derive(Debug, Deserialize)]
struct PushAck {
    id: Option<String>,
}

/// HTTP implementation of [`PushClient`].
pub struct HttpPushClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpPushClient {
    /// Build a client from configuration.
    ///
    /// Missing URL or credential is *not* an error here: per the error
    /// design, a misconfigured client reports the problem on every
    /// push instead of crashing the host at startup.
    pub fn new(config: &SyncConfig) -> Self {
        let timeout = Duration::from_millis(config.push_timeout_ms.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        HttpPushClient {
            http,
            base_url: config.remote_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, model: Model) -> String {
        format!("{}/sync/{}", self.base_url, model.as_str())
    }
}

#[async_trait]
impl PushClient for HttpPushClient {
    async fn push(&self, record: &Record) -> Result<(), PushError> {
        if self.base_url.is_empty() {
            return Err(PushError::NotConfigured("remote base URL is not set"));
        }
        if self.api_key.is_empty() {
            return Err(PushError::NotConfigured("API key is not set"));
        }

        let response = self
            .http
            .post(self.endpoint(record.model))
            .bearer_auth(&self.api_key)
            .json(&record.wire_body())
            .send()
            .await
            .map_err(|e| PushError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let ack: PushAck = response
            .json()
            .await
            .map_err(|e| PushError::BadAck(e.to_string()))?;
        match ack.id {
            Some(ref id) if *id == record.id => Ok(()),
            Some(id) => Err(PushError::BadAck(format!(
                "remote acknowledged id '{}', expected '{}'",
                id, record.id
            ))),
            None => Err(PushError::BadAck("response missing record id".to_string())),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
