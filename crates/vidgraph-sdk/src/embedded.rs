//! EmbeddedClient: in-process graph engine
//!
//! Implements the same contract as the remote engine for the subset of
//! DQL the application uses: typed root functions with index checks,
//! full-text term matching, ordering, paging, forward and reverse edge
//! traversal and `count(uid)`. Writes are buffered per transaction and
//! applied atomically on commit.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{GraphClient, Transaction};
use crate::dql::{Block, Direction, Field, Func, Literal, Query};
use crate::error::{SdkError, SdkResult};
use crate::models::{Mutation, MutationResponse, Operation, TxnMode, Uid};
use crate::schema::{Schema, Tokenizer};

const TYPE_PREDICATE: &str = "dgraph.type";

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Lowercased alphanumeric terms of `text`, stop words removed
pub fn fulltext_terms(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

#[derive(Debug, Clone, Default)]
struct MemNode {
    types: Vec<String>,
    scalars: BTreeMap<String, serde_json::Value>,
    edges: BTreeMap<String, BTreeSet<Uid>>,
}

#[derive(Debug, Default)]
struct Faults {
    rejected_types: HashSet<String>,
    failing_commits: u32,
}

#[derive(Debug, Default)]
struct MemoryGraph {
    schema: Option<Schema>,
    nodes: BTreeMap<Uid, MemNode>,
    next_uid: u64,
    faults: Faults,
}

impl MemoryGraph {
    fn allocate(&mut self) -> Uid {
        self.next_uid += 1;
        Uid::new(self.next_uid)
    }
}

/// In-process client holding the whole graph in memory.
///
/// No network overhead. Used by tests and by the CLI's `--embedded` mode.
pub struct EmbeddedClient {
    store: Arc<RwLock<MemoryGraph>>,
    queries: AtomicU64,
    commits: AtomicU64,
}

impl EmbeddedClient {
    /// Create a new EmbeddedClient with an empty graph and no schema
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryGraph::default())),
            queries: AtomicU64::new(0),
            commits: AtomicU64::new(0),
        }
    }

    /// Number of queries executed so far
    pub fn query_count(&self) -> u64 {
        self.queries.load(AtomicOrdering::SeqCst)
    }

    /// Number of transactions committed with at least one mutation
    pub fn commit_count(&self) -> u64 {
        self.commits.load(AtomicOrdering::SeqCst)
    }

    /// Number of nodes currently stored
    pub async fn node_count(&self) -> usize {
        self.store.read().await.nodes.len()
    }

    /// Currently declared schema, if any
    pub async fn schema(&self) -> Option<Schema> {
        self.store.read().await.schema.clone()
    }

    /// Make every mutation that sets a node of `type_name` fail
    pub async fn reject_type(&self, type_name: &str) {
        self.store
            .write()
            .await
            .faults
            .rejected_types
            .insert(type_name.to_string());
    }

    /// Make the next `n` commits fail with an aborted-transaction error
    pub async fn fail_next_commits(&self, n: u32) {
        self.store.write().await.faults.failing_commits = n;
    }
}

impl Default for EmbeddedClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphClient for EmbeddedClient {
    async fn alter(&self, op: Operation) -> SdkResult<()> {
        let mut graph = self.store.write().await;
        match op {
            Operation::Schema(schema) => {
                match graph.schema.as_mut() {
                    Some(existing) => existing.merge(&schema),
                    None => graph.schema = Some(schema),
                }
                debug!("schema altered");
            }
            Operation::DropAll => {
                graph.schema = None;
                graph.nodes.clear();
                debug!("dropped all data and schema");
            }
        }
        Ok(())
    }

    fn txn(&self, mode: TxnMode) -> Box<dyn Transaction + '_> {
        Box::new(EmbeddedTxn {
            client: self,
            mode,
            pending: Vec::new(),
            finished: false,
        })
    }

    async fn health(&self) -> SdkResult<()> {
        Ok(())
    }
}

/// A write resolved against the uid space at mutate time
#[derive(Debug)]
enum Write {
    Set {
        uid: Uid,
        types: Vec<String>,
        scalars: Vec<(String, serde_json::Value)>,
        edges: Vec<(String, Uid)>,
    },
    DeleteNode(Uid),
    DeletePredicate(Uid, String),
    DeleteEdge(Uid, String, Uid),
}

struct EmbeddedTxn<'a> {
    client: &'a EmbeddedClient,
    mode: TxnMode,
    pending: Vec<Write>,
    finished: bool,
}

fn parse_uid_ref(
    raw: &serde_json::Value,
    blanks: &mut HashMap<String, Uid>,
    graph: &mut MemoryGraph,
) -> SdkResult<Uid> {
    let s = raw
        .as_str()
        .ok_or_else(|| SdkError::MutationError(format!("uid must be a string: {}", raw)))?;
    match s.strip_prefix("_:") {
        Some(name) => {
            if let Some(uid) = blanks.get(name) {
                return Ok(*uid);
            }
            let uid = graph.allocate();
            blanks.insert(name.to_string(), uid);
            Ok(uid)
        }
        None => s.parse().map_err(SdkError::MutationError),
    }
}

fn type_names(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::String(s) => vec![s.clone()],
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolve one set object (and any nested references) into writes
fn resolve_set(
    object: &serde_json::Value,
    blanks: &mut HashMap<String, Uid>,
    graph: &mut MemoryGraph,
    out: &mut Vec<Write>,
) -> SdkResult<Uid> {
    let map = object
        .as_object()
        .ok_or_else(|| SdkError::MutationError(format!("set object must be a map: {}", object)))?;

    let uid = match map.get("uid") {
        Some(raw) => parse_uid_ref(raw, blanks, graph)?,
        None => graph.allocate(),
    };

    let mut types = Vec::new();
    let mut scalars = Vec::new();
    let mut edges = Vec::new();

    for (key, value) in map {
        if key == "uid" {
            continue;
        }
        if key == TYPE_PREDICATE {
            types = type_names(value);
            continue;
        }
        match value {
            serde_json::Value::Object(inner) if inner.contains_key("uid") => {
                let target = resolve_set(value, blanks, graph, out)?;
                edges.push((key.clone(), target));
            }
            serde_json::Value::Array(items)
                if !items.is_empty()
                    && items.iter().all(|i| i.get("uid").is_some()) =>
            {
                for item in items {
                    let target = resolve_set(item, blanks, graph, out)?;
                    edges.push((key.clone(), target));
                }
            }
            other => scalars.push((key.clone(), other.clone())),
        }
    }

    for ty in &types {
        if graph.faults.rejected_types.contains(ty) {
            return Err(SdkError::MutationError(format!(
                "mutation rejected for type {}",
                ty
            )));
        }
    }

    out.push(Write::Set { uid, types, scalars, edges });
    Ok(uid)
}

fn resolve_delete(
    object: &serde_json::Value,
    blanks: &mut HashMap<String, Uid>,
    graph: &mut MemoryGraph,
    out: &mut Vec<Write>,
) -> SdkResult<()> {
    let map = object
        .as_object()
        .ok_or_else(|| SdkError::MutationError(format!("delete object must be a map: {}", object)))?;
    let raw = map
        .get("uid")
        .ok_or_else(|| SdkError::MutationError("delete object requires a uid".to_string()))?;
    let uid = parse_uid_ref(raw, blanks, graph)?;

    if map.len() == 1 {
        out.push(Write::DeleteNode(uid));
        return Ok(());
    }
    for (key, value) in map {
        if key == "uid" {
            continue;
        }
        let targets: Vec<&serde_json::Value> = match value {
            serde_json::Value::Array(items) => items.iter().collect(),
            serde_json::Value::Object(_) => vec![value],
            _ => Vec::new(),
        };
        let target_uids: Vec<&serde_json::Value> =
            targets.iter().filter_map(|t| t.get("uid")).collect();
        if target_uids.is_empty() {
            out.push(Write::DeletePredicate(uid, key.clone()));
        } else {
            for t in target_uids {
                let target = parse_uid_ref(t, blanks, graph)?;
                out.push(Write::DeleteEdge(uid, key.clone(), target));
            }
        }
    }
    Ok(())
}

fn apply(graph: &mut MemoryGraph, write: Write) {
    match write {
        Write::Set { uid, types, scalars, edges } => {
            let node = graph.nodes.entry(uid).or_default();
            for ty in types {
                if !node.types.contains(&ty) {
                    node.types.push(ty);
                }
            }
            for (key, value) in scalars {
                node.scalars.insert(key, value);
            }
            for (key, target) in edges {
                node.edges.entry(key).or_default().insert(target);
            }
        }
        Write::DeleteNode(uid) => {
            graph.nodes.remove(&uid);
            for node in graph.nodes.values_mut() {
                for targets in node.edges.values_mut() {
                    targets.remove(&uid);
                }
            }
        }
        Write::DeletePredicate(uid, key) => {
            if let Some(node) = graph.nodes.get_mut(&uid) {
                if key == TYPE_PREDICATE {
                    node.types.clear();
                }
                node.scalars.remove(&key);
                node.edges.remove(&key);
            }
        }
        Write::DeleteEdge(uid, key, target) => {
            if let Some(targets) = graph.nodes.get_mut(&uid).and_then(|n| n.edges.get_mut(&key)) {
                targets.remove(&target);
            }
        }
    }
}

#[async_trait]
impl Transaction for EmbeddedTxn<'_> {
    async fn query(&mut self, query: &Query) -> SdkResult<serde_json::Value> {
        if self.finished {
            return Err(SdkError::TxnFinished);
        }
        self.client.queries.fetch_add(1, AtomicOrdering::SeqCst);
        debug!("query: {}", query.render());
        let graph = self.client.store.read().await;
        execute(&graph, query)
    }

    async fn mutate(&mut self, mutation: &Mutation) -> SdkResult<MutationResponse> {
        if self.finished {
            return Err(SdkError::TxnFinished);
        }
        if self.mode == TxnMode::ReadOnly {
            return Err(SdkError::ReadOnlyTxn);
        }

        let mut graph = self.client.store.write().await;
        let mut blanks = HashMap::new();
        let mut writes = Vec::new();
        for object in &mutation.set {
            resolve_set(object, &mut blanks, &mut graph, &mut writes)?;
        }
        for object in &mutation.delete {
            resolve_delete(object, &mut blanks, &mut graph, &mut writes)?;
        }
        self.pending.extend(writes);

        Ok(MutationResponse { uids: blanks })
    }

    async fn commit(&mut self) -> SdkResult<()> {
        if self.finished {
            return Err(SdkError::TxnFinished);
        }
        self.finished = true;
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut graph = self.client.store.write().await;
        if graph.faults.failing_commits > 0 {
            graph.faults.failing_commits -= 1;
            self.pending.clear();
            return Err(SdkError::TxnAborted(
                "Transaction has been aborted. Please retry".to_string(),
            ));
        }
        for write in self.pending.drain(..) {
            apply(&mut graph, write);
        }
        self.client.commits.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(())
    }

    async fn discard(&mut self) -> SdkResult<()> {
        self.finished = true;
        self.pending.clear();
        Ok(())
    }
}

// ============================================================
// Query evaluation
// ============================================================

fn execute(graph: &MemoryGraph, query: &Query) -> SdkResult<serde_json::Value> {
    let mut data = serde_json::Map::new();
    for block in &query.blocks {
        data.insert(block.name.clone(), eval_block(graph, block)?);
    }
    Ok(serde_json::Value::Object(data))
}

fn require_index(graph: &MemoryGraph, predicate: &str, tokenizer: Option<Tokenizer>) -> SdkResult<()> {
    let declared = graph.schema.as_ref().and_then(|s| s.predicate(predicate));
    let ok = match (declared, tokenizer) {
        (Some(p), Some(t)) => p.has_index(t),
        (Some(p), None) => p.is_indexed(),
        (None, _) => false,
    };
    if ok {
        Ok(())
    } else {
        Err(SdkError::QueryError(format!(
            "Predicate {} is not indexed",
            predicate
        )))
    }
}

fn check_func(graph: &MemoryGraph, func: &Func) -> SdkResult<()> {
    match func {
        Func::Eq { predicate, .. } | Func::Gt { predicate, .. } => {
            require_index(graph, predicate, None)
        }
        Func::AnyOfText { predicate, .. } => {
            require_index(graph, predicate, Some(Tokenizer::Fulltext))
        }
        Func::Type(_) | Func::Uid(_) => Ok(()),
    }
}

fn scalar_values(value: &serde_json::Value) -> Vec<&serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn literal_eq(value: &serde_json::Value, literal: &Literal) -> bool {
    match literal {
        Literal::Str(s) => value.as_str() == Some(s.as_str()),
        Literal::Int(n) => value.as_i64() == Some(*n) || value.as_str() == Some(n.to_string().as_str()),
    }
}

fn literal_gt(value: &serde_json::Value, literal: &Literal) -> bool {
    match literal {
        Literal::Int(n) => numeric(value).map(|v| v > *n as f64).unwrap_or(false),
        Literal::Str(s) => value.as_str().map(|v| v > s.as_str()).unwrap_or(false),
    }
}

fn numeric(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn matches(uid: Uid, node: &MemNode, func: &Func) -> bool {
    match func {
        Func::Type(name) => node.types.iter().any(|t| t == name),
        Func::Uid(uids) => uids.contains(&uid),
        Func::Eq { predicate, value } => node
            .scalars
            .get(predicate)
            .map(|v| scalar_values(v).into_iter().any(|v| literal_eq(v, value)))
            .unwrap_or(false),
        Func::Gt { predicate, value } => node
            .scalars
            .get(predicate)
            .map(|v| scalar_values(v).into_iter().any(|v| literal_gt(v, value)))
            .unwrap_or(false),
        Func::AnyOfText { predicate, text } => {
            let wanted = fulltext_terms(text);
            node.scalars
                .get(predicate)
                .and_then(|v| v.as_str())
                .map(|stored| !fulltext_terms(stored).is_disjoint(&wanted))
                .unwrap_or(false)
        }
    }
}

fn compare_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) if a.is_number() && b.is_number() => {
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            _ => a.as_str().unwrap_or_default().cmp(b.as_str().unwrap_or_default()),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn eval_block(graph: &MemoryGraph, block: &Block) -> SdkResult<serde_json::Value> {
    check_func(graph, &block.func)?;
    if let Some(filter) = &block.filter {
        check_func(graph, filter)?;
    }

    let mut selected: Vec<(&Uid, &MemNode)> = graph
        .nodes
        .iter()
        .filter(|(uid, node)| matches(**uid, node, &block.func))
        .filter(|(uid, node)| {
            block
                .filter
                .as_ref()
                .map(|f| matches(**uid, node, f))
                .unwrap_or(true)
        })
        .collect();

    if let Some(order) = &block.order {
        selected.sort_by(|(_, a), (_, b)| {
            let ord = compare_values(a.scalars.get(&order.predicate), b.scalars.get(&order.predicate));
            match order.direction {
                Direction::Asc => ord,
                // missing values stay last in both directions
                Direction::Desc => match (a.scalars.get(&order.predicate), b.scalars.get(&order.predicate)) {
                    (Some(_), Some(_)) => ord.reverse(),
                    _ => ord,
                },
            }
        });
    }

    let offset = block.offset.unwrap_or(0).max(0) as usize;
    let mut window: Vec<(&Uid, &MemNode)> = selected.into_iter().skip(offset).collect();
    match block.first {
        Some(n) if n >= 0 => window.truncate(n as usize),
        Some(n) => {
            let keep = n.unsigned_abs() as usize;
            if window.len() > keep {
                window.drain(..window.len() - keep);
            }
        }
        None => {}
    }

    if let Some(Field::Count { alias }) = block.fields.iter().find(|f| matches!(f, Field::Count { .. })) {
        let mut row = serde_json::Map::new();
        row.insert(alias.clone(), serde_json::Value::from(window.len()));
        return Ok(serde_json::Value::Array(vec![serde_json::Value::Object(row)]));
    }

    let mut items = Vec::new();
    for (uid, _) in window {
        if let Some(obj) = project(graph, *uid, &block.fields)? {
            items.push(obj);
        }
    }
    Ok(serde_json::Value::Array(items))
}

fn project(graph: &MemoryGraph, uid: Uid, fields: &[Field]) -> SdkResult<Option<serde_json::Value>> {
    let node = match graph.nodes.get(&uid) {
        Some(node) => node,
        None => return Ok(None),
    };

    let mut obj = serde_json::Map::new();
    for field in fields {
        match field {
            Field::Uid => {
                obj.insert("uid".to_string(), serde_json::Value::String(uid.to_string()));
            }
            Field::Scalar(name) if name == TYPE_PREDICATE => {
                obj.insert(name.clone(), serde_json::json!(node.types));
            }
            Field::Scalar(name) => {
                if let Some(value) = node.scalars.get(name) {
                    obj.insert(name.clone(), value.clone());
                }
            }
            Field::Edge { predicate, reverse: false, fields: nested } => {
                let mut children = Vec::new();
                for target in node.edges.get(predicate).into_iter().flatten() {
                    if let Some(child) = project(graph, *target, nested)? {
                        children.push(child);
                    }
                }
                if !children.is_empty() {
                    obj.insert(predicate.clone(), serde_json::Value::Array(children));
                }
            }
            Field::Edge { predicate, reverse: true, fields: nested } => {
                let reversible = graph
                    .schema
                    .as_ref()
                    .and_then(|s| s.predicate(predicate))
                    .map(|p| p.reverse)
                    .unwrap_or(false);
                if !reversible {
                    return Err(SdkError::QueryError(format!(
                        "Predicate {} doesn't have reverse edge",
                        predicate
                    )));
                }
                let mut children = Vec::new();
                for (source, other) in &graph.nodes {
                    let links = other.edges.get(predicate).map(|t| t.contains(&uid)).unwrap_or(false);
                    if links {
                        if let Some(child) = project(graph, *source, nested)? {
                            children.push(child);
                        }
                    }
                }
                if !children.is_empty() {
                    obj.insert(field.result_key(), serde_json::Value::Array(children));
                }
            }
            Field::Count { .. } => {}
        }
    }

    if obj.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::Value::Object(obj)))
    }
}
