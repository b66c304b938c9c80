//! Scoped transaction helpers
//!
//! Each helper opens one transaction and guarantees it ends in commit or
//! discard on every path, including errors.

use tracing::{debug, warn};
use vidgraph_sdk::dql::Query;
use vidgraph_sdk::{GraphClient, Mutation, MutationResponse, SdkResult, TxnMode};

/// Run a read-only query and return the `data` object
pub async fn read<C>(client: &C, query: &Query) -> SdkResult<serde_json::Value>
where
    C: GraphClient + ?Sized,
{
    let mut txn = client.txn(TxnMode::ReadOnly);
    let result = txn.query(query).await;
    if let Err(e) = txn.discard().await {
        warn!("Discarding read-only transaction failed: {}", e);
    }
    result
}

/// Apply one mutation in its own transaction and commit it
pub async fn write<C>(client: &C, mutation: &Mutation) -> SdkResult<MutationResponse>
where
    C: GraphClient + ?Sized,
{
    let mut txn = client.txn(TxnMode::ReadWrite);
    let result = match txn.mutate(mutation).await {
        Ok(response) => txn.commit().await.map(|_| response),
        Err(e) => Err(e),
    };
    // no-op after a successful commit
    if let Err(e) = txn.discard().await {
        warn!("Discarding transaction failed: {}", e);
    }
    if result.is_ok() {
        debug!(
            "Committed mutation ({} set, {} delete)",
            mutation.set.len(),
            mutation.delete.len()
        );
    }
    result
}
