//! Error types for the vidgraph SDK

use thiserror::Error;

/// Errors that can occur when talking to the graph engine
#[derive(Error, Debug)]
pub enum SdkError {
    /// Engine unreachable or unhealthy
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Query rejected or failed by the engine
    #[error("Query error: {0}")]
    QueryError(String),

    /// Mutation rejected or failed by the engine
    #[error("Mutation error: {0}")]
    MutationError(String),

    /// Schema alteration failed
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Transaction aborted by the engine (conflict); safe to retry
    #[error("Transaction aborted: {0}")]
    TxnAborted(String),

    /// Transaction already committed or discarded
    #[error("Transaction has already been committed or discarded")]
    TxnFinished,

    /// Mutation attempted in a read-only transaction
    #[error("Cannot mutate in a read-only transaction")]
    ReadOnlyTxn,
}

impl SdkError {
    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SdkError::ConnectionError(_) | SdkError::TxnAborted(_) => true,
            SdkError::HttpError(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SdkError::TxnAborted("conflict".into()).is_transient());
        assert!(SdkError::ConnectionError("refused".into()).is_transient());
        assert!(!SdkError::QueryError("bad".into()).is_transient());
        assert!(!SdkError::ReadOnlyTxn.is_transient());
    }
}
