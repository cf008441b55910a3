//! HTTP implementation of the [`LogCollector`] port.
//!
//! Posts a session record as JSON to the collector endpoint
//! (`/api/log_session`). Only a 2xx reply whose body is
//! `{"status":"success"}` counts as delivered; anything else, including an
//! unparseable body, is a failure the caller may retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use focus_core::config::CollectorConfig;
use focus_core::delivery::LogCollector;
use focus_core::error::{FocusError, Result};
use focus_core::session::FinalizedSessionRecord;

#[derive(Debug, Deserialize)]
struct CollectorResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Collector client over reqwest.
#[derive(Debug, Clone)]
pub struct HttpLogCollector {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpLogCollector {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        client: &Client,
        endpoint: &str,
        timeout: Duration,
        record: &FinalizedSessionRecord,
    ) -> Result<()> {
        let response = client
            .post(endpoint)
            .json(record)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FocusError::delivery_failed(1, format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FocusError::delivery_failed(1, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(FocusError::delivery_failed(
                1,
                format!("Collector returned {}: {}", status, body),
            ));
        }

        let parsed: CollectorResponse = serde_json::from_str(&body).map_err(|e| {
            FocusError::delivery_failed(1, format!("Malformed collector response: {}", e))
        })?;

        if parsed.status != "success" {
            return Err(FocusError::delivery_failed(
                1,
                format!(
                    "Collector rejected record: status '{}'{}",
                    parsed.status,
                    parsed
                        .message
                        .map(|m| format!(" ({})", m))
                        .unwrap_or_default()
                ),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl LogCollector for HttpLogCollector {
    async fn post(&self, record: &FinalizedSessionRecord) -> Result<()> {
        tracing::debug!(
            "[HttpLogCollector] POST {} ({})",
            self.endpoint,
            record.summary()
        );
        Self::send(&self.client, &self.endpoint, self.timeout, record).await
    }

    fn beacon(&self, record: FinalizedSessionRecord) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                "[HttpLogCollector] No runtime for beacon, dropping {}",
                record.summary()
            );
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        handle.spawn(async move {
            if let Err(e) = Self::send(&client, &endpoint, timeout, &record).await {
                tracing::debug!(
                    "[HttpLogCollector] Beacon for {} lost: {}",
                    record.summary(),
                    e
                );
            }
        });
    }
}
