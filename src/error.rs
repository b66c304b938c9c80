//! Error taxonomy for loading, querying and deleting
//!
//! Failures are contained at the smallest useful boundary: lookup misses
//! are per-row outcomes (see `loader::report::RowOutcome`), node batch
//! failures end one load step, and only a missing source set aborts a
//! whole load.

use std::path::PathBuf;
use thiserror::Error;
use vidgraph_sdk::SdkError;

/// Errors surfaced by the vidgraph core
#[derive(Error, Debug)]
pub enum VidgraphError {
    /// Engine unreachable; the session can keep prompting but not load or query
    #[error("Connection error: {0}")]
    Connection(String),

    /// Schema could not be declared; callers log this as a warning
    #[error("Could not set schema: {0}")]
    SchemaDeclaration(#[source] SdkError),

    /// Pre-flight check found required source files absent
    #[error("Missing data files: {}", display_paths(.0))]
    MissingSources(Vec<PathBuf>),

    /// A source file could not be read or does not have the expected shape
    #[error("Source error in {}: {message}", .path.display())]
    Source { path: PathBuf, message: String },

    /// A write failed or was rejected by the engine
    #[error("Mutation failed: {0}")]
    Mutation(#[source] SdkError),

    /// A read failed or was rejected by the engine
    #[error("Query failed: {0}")]
    Query(#[source] SdkError),

    /// Engine answered with something we cannot interpret
    #[error("Unexpected response: {0}")]
    Response(String),

    /// Invalid user input (menu choice, numeric prompt)
    #[error("Invalid input: {0}")]
    MalformedInput(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl VidgraphError {
    pub(crate) fn source_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        VidgraphError::Source {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Map a read-side engine error, keeping connectivity distinct
    pub(crate) fn from_query(e: SdkError) -> Self {
        match e {
            SdkError::ConnectionError(msg) => VidgraphError::Connection(msg),
            SdkError::HttpError(e) if e.is_connect() => VidgraphError::Connection(e.to_string()),
            other => VidgraphError::Query(other),
        }
    }

    /// Map a write-side engine error, keeping connectivity distinct
    pub(crate) fn from_mutation(e: SdkError) -> Self {
        match e {
            SdkError::ConnectionError(msg) => VidgraphError::Connection(msg),
            SdkError::HttpError(e) if e.is_connect() => VidgraphError::Connection(e.to_string()),
            other => VidgraphError::Mutation(other),
        }
    }
}

pub type VidgraphResult<T> = Result<T, VidgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sources_lists_every_path() {
        let err = VidgraphError::MissingSources(vec![
            PathBuf::from("data/nodes/users.csv"),
            PathBuf::from("data/edges/user_posts_video.csv"),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing data files: data/nodes/users.csv, data/edges/user_posts_video.csv"
        );
    }

    #[test]
    fn test_connection_errors_stay_distinct() {
        let err = VidgraphError::from_query(SdkError::ConnectionError("refused".into()));
        assert!(matches!(err, VidgraphError::Connection(_)));
        let err = VidgraphError::from_mutation(SdkError::MutationError("bad".into()));
        assert!(matches!(err, VidgraphError::Mutation(_)));
    }
}
