//! Error types for the summarization pipeline.
//!
//! Each component fails with its own type so callers can apply the right
//! policy: a schema mismatch rejects one record, a coercion failure drops one
//! window, source failures end the run and sink failures follow the configured
//! [`SinkFailurePolicy`](crate::pipeline::SinkFailurePolicy).

use thiserror::Error;

/// A record's column set disagrees with the schema established by the first record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("schema mismatch: missing columns {missing:?}, unexpected columns {extra:?}")]
pub struct SchemaMismatch {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
}

/// A cell could not be read as numeric-or-null during summarization.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("column '{column}' at window position {position} is not numeric: {value}")]
pub struct TypeCoercionError {
    pub column: String,
    pub position: usize,
    pub value: String,
}

/// Failure reading the next record from a source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("source failure: {0}")]
    Other(String),
}

/// Failure handing a summary to a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("sink rejected summary ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<SinkError> },
}

/// Errors that end a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("source read failed: {0}")]
    SourceRead(#[from] SourceError),

    #[error("sink write failed for summary {sequence}: {source}")]
    SinkWrite {
        sequence: u64,
        #[source]
        source: SinkError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchemaMismatch {
            missing: vec!["b".to_string()],
            extra: vec!["c".to_string()],
        };
        assert!(err.to_string().contains("\"b\""));
        assert!(err.to_string().contains("\"c\""));

        let err = TypeCoercionError {
            column: "speed".to_string(),
            position: 3,
            value: "\"fast\"".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'speed' at window position 3 is not numeric: \"fast\""
        );

        let err = SinkError::RetriesExhausted {
            attempts: 3,
            last: Box::new(SinkError::Network("timeout".to_string())),
        };
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("timeout"));
    }
}
