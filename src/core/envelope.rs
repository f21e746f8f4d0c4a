//! Export envelope for summaries.
//!
//! Sinks that hand summaries to other systems wrap each one with producer
//! metadata so downstream consumers can tell runs and hosts apart.

use crate::core::summary::Summary;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The current envelope format version.
pub const ENVELOPE_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "stream-summary-agent";

/// Producer metadata attached to every exported summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    /// Name of the producing software
    pub name: String,
    /// Version of the producing software
    pub version: String,
    /// Unique per-process instance identifier
    pub instance_id: String,
    /// Host the producer runs on
    pub host: String,
}

/// A summary ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEnvelope {
    /// Envelope format version
    pub envelope_version: String,
    /// When the envelope was built (RFC3339)
    pub emitted_at_utc: String,
    pub producer: Producer,
    pub summary: Summary,
}

/// Builds envelopes with a fixed instance identity.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    instance_id: Uuid,
    host: String,
}

impl EnvelopeBuilder {
    /// Create a builder with a fresh instance ID and the local hostname.
    pub fn new() -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            instance_id: Uuid::new_v4(),
            host,
        }
    }

    /// Override the reported host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Wrap a summary.
    pub fn build(&self, summary: &Summary) -> SummaryEnvelope {
        SummaryEnvelope {
            envelope_version: ENVELOPE_VERSION.to_string(),
            emitted_at_utc: Utc::now().to_rfc3339(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id.to_string(),
                host: self.host.clone(),
            },
            summary: summary.clone(),
        }
    }
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn empty_summary(sequence: u64) -> Summary {
        Summary {
            sequence,
            first_offset: sequence * 10,
            record_count: 10,
            computed_at: Utc::now(),
            columns: BTreeMap::new(),
        }
    }

    #[test]
    fn test_builder_keeps_instance_id() {
        let builder = EnvelopeBuilder::new().with_host("test-host");
        let first = builder.build(&empty_summary(0));
        let second = builder.build(&empty_summary(1));

        assert_eq!(first.producer.instance_id, second.producer.instance_id);
        assert_eq!(first.producer.instance_id, builder.instance_id().to_string());
        assert_eq!(first.producer.host, "test-host");
        assert_eq!(first.producer.name, PRODUCER_NAME);
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = EnvelopeBuilder::new().build(&empty_summary(3));
        let json: serde_json::Value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["envelope_version"], "1.0");
        assert_eq!(json["summary"]["sequence"], 3);
        assert_eq!(json["summary"]["first_offset"], 30);
        assert!(json["emitted_at_utc"].as_str().is_some());
        assert!(json["producer"]["version"].as_str().is_some());
    }
}
