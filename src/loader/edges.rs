//! Relationship loader: resolve both endpoints of every row, then link them

use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};
use vidgraph_sdk::dql::{Block, Field, Func, Query};
use vidgraph_sdk::{GraphClient, Mutation, Uid};

use super::keys::KeyIndex;
use super::report::{LoadReport, RowOutcome, Side};
use crate::config::{AmbiguityPolicy, LoaderConfig, ResolutionStrategy};
use crate::error::{VidgraphError, VidgraphResult};
use crate::model::{Endpoint, EntityKind, KeyMatch, RelationKind};
use crate::retry::with_retry;
use crate::source::{read_table, Table};
use crate::txn;

/// Lookup query for one natural key, restricted to the entity's type
pub fn lookup_query(entity: EntityKind, key: &str) -> Query {
    let func = match entity.key_match() {
        KeyMatch::Exact => Func::eq(entity.key_predicate(), key),
        KeyMatch::FullText => Func::any_of_text(entity.key_predicate(), key),
    };
    Query::new(
        Block::new(entity.lookup_name(), func)
            .filter(Func::of_type(entity.type_name()))
            .field(Field::Uid),
    )
}

fn parse_uids(data: &serde_json::Value, name: &str) -> VidgraphResult<Vec<Uid>> {
    let items = match data.get(name) {
        Some(serde_json::Value::Array(items)) => items,
        Some(other) => {
            return Err(VidgraphError::Response(format!(
                "'{}' is not a list: {}",
                name, other
            )))
        }
        None => return Ok(Vec::new()),
    };
    items
        .iter()
        .map(|item| {
            item.get("uid")
                .and_then(|u| u.as_str())
                .ok_or_else(|| VidgraphError::Response(format!("match without uid: {}", item)))?
                .parse()
                .map_err(VidgraphError::Response)
        })
        .collect()
}

/// Endpoint resolution for one load
pub struct Resolver<'a, C: GraphClient + ?Sized> {
    client: &'a C,
    config: &'a LoaderConfig,
    keys: Option<&'a KeyIndex>,
}

enum Resolved {
    Found(Uid),
    Missing(RowOutcome),
}

impl<'a, C: GraphClient + ?Sized> Resolver<'a, C> {
    pub fn new(client: &'a C, config: &'a LoaderConfig) -> Self {
        Self {
            client,
            config,
            keys: None,
        }
    }

    /// Consult `keys` first when the key-index strategy is configured
    pub fn with_keys(mut self, keys: &'a KeyIndex) -> Self {
        self.keys = Some(keys);
        self
    }

    /// All uids of `entity` nodes matching `key`
    pub async fn lookup(&self, entity: EntityKind, key: &str) -> VidgraphResult<Vec<Uid>> {
        if self.config.resolution == ResolutionStrategy::KeyIndex {
            if let Some(uids) = self.keys.and_then(|k| k.get(entity, key)) {
                return Ok(uids.to_vec());
            }
        }
        let query = lookup_query(entity, key);
        let data = with_retry(&self.config.retry, &format!("{} lookup", entity), || {
            txn::read(self.client, &query)
        })
        .await
        .map_err(VidgraphError::from_query)?;
        parse_uids(&data, entity.lookup_name())
    }

    async fn resolve_side(
        &self,
        relation: RelationKind,
        endpoint: Endpoint,
        side: Side,
        key: &str,
        report: &mut LoadReport,
    ) -> VidgraphResult<Resolved> {
        let uids = self.lookup(endpoint.entity, key).await?;
        match uids.as_slice() {
            [] => {
                warn!("{}: no {} found for '{}', skipping row", relation, endpoint.entity, key);
                Ok(Resolved::Missing(RowOutcome::Unresolved {
                    side,
                    key: key.to_string(),
                }))
            }
            [uid] => Ok(Resolved::Found(*uid)),
            [first, ..] => match self.config.ambiguity {
                AmbiguityPolicy::Reject => {
                    warn!(
                        "{}: '{}' matches {} {} nodes, skipping row",
                        relation,
                        key,
                        uids.len(),
                        endpoint.entity
                    );
                    Ok(Resolved::Missing(RowOutcome::Ambiguous {
                        side,
                        key: key.to_string(),
                        matches: uids.len(),
                    }))
                }
                AmbiguityPolicy::FirstMatch => {
                    report.first_match_fallbacks += 1;
                    warn!(
                        "{}: '{}' matches {} {} nodes, using {}",
                        relation,
                        key,
                        uids.len(),
                        endpoint.entity,
                        first
                    );
                    Ok(Resolved::Found(*first))
                }
            },
        }
    }

    /// Resolve the source then the target of one row
    async fn resolve_row(
        &self,
        relation: RelationKind,
        source_key: &str,
        target_key: &str,
        report: &mut LoadReport,
    ) -> VidgraphResult<Result<(Uid, Uid), RowOutcome>> {
        let source = match self
            .resolve_side(relation, relation.source(), Side::Source, source_key, report)
            .await?
        {
            Resolved::Found(uid) => uid,
            Resolved::Missing(outcome) => return Ok(Err(outcome)),
        };
        let target = match self
            .resolve_side(relation, relation.target(), Side::Target, target_key, report)
            .await?
        {
            Resolved::Found(uid) => uid,
            Resolved::Missing(outcome) => return Ok(Err(outcome)),
        };
        Ok(Ok((source, target)))
    }

    /// Link every row of `table` with `relation`.
    ///
    /// Never fails as a whole: each row ends in exactly one outcome and
    /// a failed write only affects the rows of its own transaction.
    pub async fn load_relationship(&self, relation: RelationKind, table: &Table) -> LoadReport {
        let mut report = LoadReport::new(relation);
        let batch_size = self.config.edge_batch_size.max(1);
        let predicate = relation.predicate();
        // pairs committed earlier in this load
        let mut written: HashSet<(Uid, Uid)> = HashSet::new();
        let mut pending: Vec<(usize, Uid, Uid)> = Vec::new();

        for row in &table.rows {
            let keys = table
                .field(row, relation.source().column)
                .and_then(|s| table.field(row, relation.target().column).map(|t| (s, t)));
            let (source_key, target_key) = match keys {
                Ok(keys) => keys,
                Err(e) => {
                    report.record(row.number, RowOutcome::Failed { message: e.to_string() });
                    continue;
                }
            };

            match self.resolve_row(relation, source_key, target_key, &mut report).await {
                Ok(Ok((source, target))) => {
                    let repeated = written.contains(&(source, target))
                        || pending.iter().any(|(_, s, t)| (*s, *t) == (source, target));
                    if repeated {
                        debug!("{}: row {} repeats an edge", relation, row.number);
                        report.record(row.number, RowOutcome::Duplicate);
                        continue;
                    }
                    pending.push((row.number, source, target));
                    if pending.len() >= batch_size {
                        self.flush(predicate, &mut pending, &mut written, &mut report).await;
                    }
                }
                Ok(Err(outcome)) => report.record(row.number, outcome),
                Err(e) => {
                    warn!("{}: row {} lookup failed: {}", relation, row.number, e);
                    report.record(row.number, RowOutcome::Failed { message: e.to_string() });
                }
            }
        }
        self.flush(predicate, &mut pending, &mut written, &mut report).await;

        report.rows.sort_by_key(|r| r.row);
        info!("{}", report);
        report
    }

    /// Write the pending edges in one transaction; only committed pairs
    /// are added to `written`
    async fn flush(
        &self,
        predicate: &str,
        pending: &mut Vec<(usize, Uid, Uid)>,
        written: &mut HashSet<(Uid, Uid)>,
        report: &mut LoadReport,
    ) {
        if pending.is_empty() {
            return;
        }
        let objects = pending
            .iter()
            .map(|(_, source, target)| {
                let mut object = serde_json::Map::new();
                object.insert("uid".to_string(), json!(source.to_string()));
                object.insert(predicate.to_string(), json!([{ "uid": target.to_string() }]));
                serde_json::Value::Object(object)
            })
            .collect();
        let mutation = Mutation::set(objects);
        let result = with_retry(&self.config.retry, &format!("{} edges", predicate), || {
            txn::write(self.client, &mutation)
        })
        .await;

        match result {
            Ok(_) => {
                for (row, source, target) in pending.drain(..) {
                    written.insert((source, target));
                    report.record(row, RowOutcome::Linked);
                }
            }
            Err(e) => {
                warn!("Writing {} {} edges failed: {}", pending.len(), predicate, e);
                let message = VidgraphError::from_mutation(e).to_string();
                for (row, _, _) in pending.drain(..) {
                    report.record(row, RowOutcome::Failed { message: message.clone() });
                }
            }
        }
    }

    /// Read `path` and load its rows as `relation` edges
    pub async fn load_relationship_from_file(
        &self,
        relation: RelationKind,
        path: &Path,
    ) -> VidgraphResult<LoadReport> {
        let table = read_table(path, &relation.required_columns())?;
        Ok(self.load_relationship(relation, &table).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_queries_are_typed() {
        assert_eq!(
            lookup_query(EntityKind::Video, "Rust \"basics\"").render(),
            r#"{ video(func: eq(title, "Rust \"basics\"")) @filter(type(Video)) { uid } }"#
        );
        assert_eq!(
            lookup_query(EntityKind::Comment, "great video").render(),
            r#"{ comment(func: anyoftext(text, "great video")) @filter(type(Comment)) { uid } }"#
        );
    }

    #[test]
    fn test_parse_uids() {
        let data = json!({"user": [{"uid": "0x1"}, {"uid": "0x2a"}]});
        assert_eq!(parse_uids(&data, "user").unwrap(), vec![Uid::new(1), Uid::new(42)]);
        assert!(parse_uids(&json!({}), "user").unwrap().is_empty());
        assert!(parse_uids(&json!({"user": [{"name": "x"}]}), "user").is_err());
    }
}
