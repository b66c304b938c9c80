//! RemoteClient: network client for a running Dgraph alpha
//!
//! Speaks the Dgraph HTTP API: `/alter`, `/query`, `/mutate`, `/commit`
//! and `/health`. Transactions are tracked client-side through the
//! `extensions.txn` context returned with every response.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::client::{GraphClient, Transaction};
use crate::dql::Query;
use crate::error::{SdkError, SdkResult};
use crate::models::{Mutation, MutationResponse, Operation, TxnMode};

/// Network client that connects to a running Dgraph alpha.
pub struct RemoteClient {
    http_base_url: String,
    http_client: Client,
}

impl RemoteClient {
    /// Create a new RemoteClient for the given HTTP base URL.
    ///
    /// # Example
    /// ```no_run
    /// # use vidgraph_sdk::RemoteClient;
    /// let client = RemoteClient::new("http://localhost:8080");
    /// ```
    pub fn new(http_base_url: &str) -> Self {
        Self {
            http_base_url: http_base_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.http_base_url
    }

    /// POST a body and return the decoded JSON envelope
    async fn post(
        &self,
        path: &str,
        content_type: &str,
        body: String,
    ) -> SdkResult<serde_json::Value> {
        let url = format!("{}{}", self.http_base_url, path);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(SdkError::ConnectionError(format!(
                "{} returned {}: {}",
                path, status, text
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Which operation an engine error belongs to
#[derive(Debug, Clone, Copy)]
enum ErrorKind {
    Query,
    Mutation,
    Schema,
}

/// Turn an `errors` array in a response envelope into an `SdkError`
fn engine_error(envelope: &serde_json::Value, kind: ErrorKind) -> Option<SdkError> {
    let errors = envelope.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let message = errors
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("; ");

    if message.contains("aborted") {
        return Some(SdkError::TxnAborted(message));
    }
    Some(match kind {
        ErrorKind::Query => SdkError::QueryError(message),
        ErrorKind::Mutation => SdkError::MutationError(message),
        ErrorKind::Schema => SdkError::SchemaError(message),
    })
}

/// `extensions.txn` block of a response
#[derive(Debug, Default, Deserialize)]
struct TxnContext {
    #[serde(default)]
    start_ts: u64,
    #[serde(default)]
    keys: Vec<String>,
    #[serde(default)]
    preds: Vec<String>,
}

fn txn_context(envelope: &serde_json::Value) -> SdkResult<TxnContext> {
    match envelope.get("extensions").and_then(|e| e.get("txn")) {
        Some(txn) => Ok(serde_json::from_value(txn.clone())?),
        None => Ok(TxnContext::default()),
    }
}

fn mutation_response(envelope: &serde_json::Value) -> SdkResult<MutationResponse> {
    match envelope.get("data") {
        Some(data) => Ok(serde_json::from_value(data.clone())?),
        None => Ok(MutationResponse::default()),
    }
}

#[async_trait]
impl GraphClient for RemoteClient {
    async fn alter(&self, op: Operation) -> SdkResult<()> {
        let (content_type, body) = match op {
            Operation::Schema(schema) => ("application/dql", schema.render()),
            Operation::DropAll => (
                "application/json",
                serde_json::json!({ "drop_all": true }).to_string(),
            ),
        };
        let envelope = self.post("/alter", content_type, body).await?;
        match engine_error(&envelope, ErrorKind::Schema) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn txn(&self, mode: TxnMode) -> Box<dyn Transaction + '_> {
        Box::new(RemoteTxn {
            client: self,
            mode,
            start_ts: None,
            keys: Vec::new(),
            preds: Vec::new(),
            mutated: false,
            finished: false,
        })
    }

    async fn health(&self) -> SdkResult<()> {
        let url = format!("{}/health", self.http_base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SdkError::ConnectionError(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(SdkError::ConnectionError(format!(
                "Health endpoint returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        let instances = match body {
            serde_json::Value::Array(items) => items,
            other => vec![other],
        };
        let healthy = instances
            .iter()
            .any(|i| i.get("status").and_then(|s| s.as_str()) == Some("healthy"));
        if healthy {
            Ok(())
        } else {
            Err(SdkError::ConnectionError("Engine reports unhealthy".to_string()))
        }
    }
}

/// Client-side view of a Dgraph HTTP transaction
struct RemoteTxn<'a> {
    client: &'a RemoteClient,
    mode: TxnMode,
    start_ts: Option<u64>,
    keys: Vec<String>,
    preds: Vec<String>,
    mutated: bool,
    finished: bool,
}

impl RemoteTxn<'_> {
    fn merge_context(&mut self, ctx: TxnContext) {
        if self.start_ts.is_none() && ctx.start_ts != 0 {
            self.start_ts = Some(ctx.start_ts);
        }
        self.keys.extend(ctx.keys);
        self.preds.extend(ctx.preds);
    }

    fn query_path(&self) -> String {
        let mut params = Vec::new();
        if self.mode == TxnMode::ReadOnly {
            params.push("ro=true".to_string());
            params.push("be=true".to_string());
        }
        if let Some(ts) = self.start_ts {
            params.push(format!("startTs={}", ts));
        }
        if params.is_empty() {
            "/query".to_string()
        } else {
            format!("/query?{}", params.join("&"))
        }
    }

    fn ensure_open(&self) -> SdkResult<()> {
        if self.finished {
            Err(SdkError::TxnFinished)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transaction for RemoteTxn<'_> {
    async fn query(&mut self, query: &Query) -> SdkResult<serde_json::Value> {
        self.ensure_open()?;
        let text = query.render();
        debug!("query: {}", text);

        let envelope = self
            .client
            .post(&self.query_path(), "application/dql", text)
            .await?;
        if let Some(e) = engine_error(&envelope, ErrorKind::Query) {
            return Err(e);
        }
        self.merge_context(txn_context(&envelope)?);
        Ok(envelope
            .get("data")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({})))
    }

    async fn mutate(&mut self, mutation: &Mutation) -> SdkResult<MutationResponse> {
        self.ensure_open()?;
        if self.mode == TxnMode::ReadOnly {
            return Err(SdkError::ReadOnlyTxn);
        }
        let path = match self.start_ts {
            Some(ts) => format!("/mutate?startTs={}", ts),
            None => "/mutate".to_string(),
        };
        let body = serde_json::to_string(mutation)?;
        debug!("mutate: {} set, {} delete", mutation.set.len(), mutation.delete.len());

        let envelope = self.client.post(&path, "application/json", body).await?;
        if let Some(e) = engine_error(&envelope, ErrorKind::Mutation) {
            return Err(e);
        }
        self.merge_context(txn_context(&envelope)?);
        self.mutated = true;
        mutation_response(&envelope)
    }

    async fn commit(&mut self) -> SdkResult<()> {
        self.ensure_open()?;
        self.finished = true;
        let ts = match (self.start_ts, self.mutated) {
            (Some(ts), true) => ts,
            _ => return Ok(()),
        };
        let body = serde_json::json!({ "keys": self.keys, "preds": self.preds }).to_string();
        let envelope = self
            .client
            .post(&format!("/commit?startTs={}", ts), "application/json", body)
            .await?;
        match engine_error(&envelope, ErrorKind::Mutation) {
            Some(e) => Err(e),
            None => {
                debug!("committed txn {}", ts);
                Ok(())
            }
        }
    }

    async fn discard(&mut self) -> SdkResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let ts = match (self.start_ts, self.mutated) {
            (Some(ts), true) => ts,
            _ => return Ok(()),
        };
        let envelope = self
            .client
            .post(
                &format!("/commit?startTs={}&abort=true", ts),
                "application/json",
                "{}".to_string(),
            )
            .await?;
        match engine_error(&envelope, ErrorKind::Mutation) {
            Some(e) => Err(e),
            None => {
                debug!("discarded txn {}", ts);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_classification() {
        let envelope = serde_json::json!({
            "errors": [{ "message": ": Predicate duration is not indexed" }]
        });
        assert!(matches!(
            engine_error(&envelope, ErrorKind::Query),
            Some(SdkError::QueryError(m)) if m.contains("not indexed")
        ));

        let aborted = serde_json::json!({
            "errors": [{ "message": "Transaction has been aborted. Please retry" }]
        });
        assert!(matches!(
            engine_error(&aborted, ErrorKind::Mutation),
            Some(SdkError::TxnAborted(_))
        ));

        assert!(engine_error(&serde_json::json!({ "data": {} }), ErrorKind::Query).is_none());
    }

    #[test]
    fn test_mutation_response_and_txn_context() {
        let envelope = serde_json::json!({
            "data": { "code": "Success", "message": "Done", "uids": { "u1": "0x2a", "u2": "0x2b" } },
            "extensions": { "txn": { "start_ts": 17, "keys": ["k1"], "preds": ["1-username"] } }
        });
        let resp = mutation_response(&envelope).unwrap();
        assert_eq!(resp.uids["u1"].as_u64(), 0x2a);
        assert_eq!(resp.uids.len(), 2);

        let ctx = txn_context(&envelope).unwrap();
        assert_eq!(ctx.start_ts, 17);
        assert_eq!(ctx.preds, vec!["1-username".to_string()]);
    }

    #[test]
    fn test_query_path_modes() {
        let client = RemoteClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");

        let mut txn = RemoteTxn {
            client: &client,
            mode: TxnMode::ReadOnly,
            start_ts: None,
            keys: Vec::new(),
            preds: Vec::new(),
            mutated: false,
            finished: false,
        };
        assert_eq!(txn.query_path(), "/query?ro=true&be=true");

        txn.mode = TxnMode::ReadWrite;
        txn.merge_context(TxnContext { start_ts: 9, keys: vec![], preds: vec![] });
        assert_eq!(txn.query_path(), "/query?startTs=9");
    }
}
