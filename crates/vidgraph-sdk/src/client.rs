//! GraphClient and Transaction traits: the unified interface for embedded and remote modes

use async_trait::async_trait;

use crate::dql::Query;
use crate::error::SdkResult;
use crate::models::{Mutation, MutationResponse, Operation, TxnMode};

/// Unified client interface for the graph engine.
///
/// Implemented by:
/// - `EmbeddedClient`: in-process, no network (for tests and demo runs)
/// - `RemoteClient`: connects to a running Dgraph alpha via HTTP
#[async_trait]
pub trait GraphClient: Send + Sync {
    /// Apply a schema operation (declare schema or drop everything)
    async fn alter(&self, op: Operation) -> SdkResult<()>;

    /// Open a transaction. No round-trip happens until the first query or mutation.
    fn txn(&self, mode: TxnMode) -> Box<dyn Transaction + '_>;

    /// Check that the engine is reachable and healthy
    async fn health(&self) -> SdkResult<()>;
}

/// A single engine transaction.
///
/// Every transaction must end in `commit` or `discard`; `discard` after
/// `commit` is a no-op, so callers can discard unconditionally on exit.
#[async_trait]
pub trait Transaction: Send {
    /// Run a query, returning the `data` object keyed by block name
    async fn query(&mut self, query: &Query) -> SdkResult<serde_json::Value>;

    /// Apply a mutation inside this transaction
    async fn mutate(&mut self, mutation: &Mutation) -> SdkResult<MutationResponse>;

    /// Commit all mutations made in this transaction
    async fn commit(&mut self) -> SdkResult<()>;

    /// Abandon the transaction
    async fn discard(&mut self) -> SdkResult<()>;
}
