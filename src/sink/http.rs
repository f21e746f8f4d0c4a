//! HTTP sink posting summary envelopes to a collector endpoint.
//!
//! Each summary is sent as one JSON [`SummaryEnvelope`](crate::core::SummaryEnvelope)
//! in a `POST` request. Any non-2xx response is treated as a rejection.

use crate::core::envelope::EnvelopeBuilder;
use crate::core::summary::Summary;
use crate::error::SinkError;
use crate::sink::SummarySink;
use serde::Deserialize;
use std::time::Duration;

/// HTTP sink configuration.
#[derive(Debug, Clone)]
pub struct HttpSinkConfig {
    /// Endpoint receiving summaries (e.g. `http://127.0.0.1:8080/v1/summaries`)
    pub endpoint: String,
    /// Optional bearer token
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpSinkConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Health check URL derived from the endpoint's origin.
    pub fn health_url(&self) -> String {
        let origin = match self.endpoint.find("://") {
            Some(scheme_end) => {
                let rest = &self.endpoint[scheme_end + 3..];
                let host_end = rest.find('/').map_or(self.endpoint.len(), |i| scheme_end + 3 + i);
                &self.endpoint[..host_end]
            }
            None => self.endpoint.trim_end_matches('/'),
        };
        format!("{origin}/health")
    }
}

/// Acknowledgement returned by the collector, if it sends one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestAck {
    #[serde(default)]
    pub accepted: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl IngestAck {
    /// Read an acknowledgement body; empty or non-JSON bodies give the default.
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(body).unwrap_or_else(|e| {
            tracing::debug!("Ignoring unparsable collector acknowledgement: {}", e);
            Self::default()
        })
    }
}

/// Async HTTP client for summary delivery.
pub struct HttpSink {
    config: HttpSinkConfig,
    client: reqwest::Client,
    envelopes: EnvelopeBuilder,
}

impl HttpSink {
    pub fn new(config: HttpSinkConfig, envelopes: EnvelopeBuilder) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SinkError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            envelopes,
        })
    }

    /// Test connection to the collector.
    pub async fn test_connection(&self) -> Result<bool, SinkError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Post one summary.
    pub async fn send(&self, summary: &Summary) -> Result<IngestAck, SinkError> {
        let envelope = self.envelopes.build(summary);

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .json(&envelope);
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        // Any 2xx means delivered, the body is informational only
        let body = response.text().await.unwrap_or_default();
        Ok(IngestAck::parse(&body))
    }
}

/// Blocking HTTP sink for the synchronous pipeline driver.
pub struct BlockingHttpSink {
    inner: HttpSink,
    runtime: tokio::runtime::Runtime,
}

impl BlockingHttpSink {
    pub fn new(config: HttpSinkConfig, envelopes: EnvelopeBuilder) -> Result<Self, SinkError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            inner: HttpSink::new(config, envelopes)?,
            runtime,
        })
    }

    /// Test connection to the collector.
    pub fn test_connection(&self) -> Result<bool, SinkError> {
        self.runtime.block_on(self.inner.test_connection())
    }
}

impl SummarySink for BlockingHttpSink {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        let ack = self.runtime.block_on(self.inner.send(summary))?;
        if let Some(message) = ack.message {
            tracing::debug!("Collector acknowledged summary {}: {}", summary.sequence, message);
        }
        Ok(())
    }
}
