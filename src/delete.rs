//! Destructive operations: delete comments by term, drop everything

use serde_json::json;
use tracing::{info, warn};
use vidgraph_sdk::dql::{Block, Field, Func, Query};
use vidgraph_sdk::{GraphClient, Mutation, Operation, Uid};

use crate::error::{VidgraphError, VidgraphResult};
use crate::txn;

/// Result of a delete-by-term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(usize),
    NothingMatched,
}

impl DeleteOutcome {
    pub fn count(&self) -> usize {
        match self {
            DeleteOutcome::Deleted(n) => *n,
            DeleteOutcome::NothingMatched => 0,
        }
    }
}

/// Delete every Comment whose text matches any term of `term`.
///
/// Matching uids are read in one read-only transaction and removed in a
/// single mutation.
pub async fn delete_comments_matching<C>(client: &C, term: &str) -> VidgraphResult<DeleteOutcome>
where
    C: GraphClient + ?Sized,
{
    let query = Query::new(
        Block::new("comments", Func::any_of_text("text", term))
            .filter(Func::of_type("Comment"))
            .field(Field::Uid),
    );
    let data = txn::read(client, &query)
        .await
        .map_err(VidgraphError::from_query)?;

    #[derive(serde::Deserialize)]
    struct Hit {
        uid: Uid,
    }
    let hits: Vec<Hit> = match data.get("comments") {
        Some(rows) => serde_json::from_value(rows.clone())
            .map_err(|e| VidgraphError::Response(e.to_string()))?,
        None => Vec::new(),
    };

    if hits.is_empty() {
        info!("No comments found matching '{}'", term);
        return Ok(DeleteOutcome::NothingMatched);
    }

    let deletes = hits
        .iter()
        .map(|h| json!({ "uid": h.uid.to_string() }))
        .collect();
    txn::write(client, &Mutation::delete(deletes))
        .await
        .map_err(VidgraphError::from_mutation)?;

    info!("Deleted {} comment(s) matching '{}'", hits.len(), term);
    Ok(DeleteOutcome::Deleted(hits.len()))
}

/// Remove all data and the schema. The schema must be declared again
/// before loading or querying.
pub async fn drop_all<C>(client: &C) -> VidgraphResult<()>
where
    C: GraphClient + ?Sized,
{
    client.alter(Operation::DropAll).await.map_err(|e| {
        warn!("Drop all failed: {}", e);
        VidgraphError::from_mutation(e)
    })?;
    info!("All data and schema dropped");
    Ok(())
}
