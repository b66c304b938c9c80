//! Full load: nodes first, then every relationship

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vidgraph_sdk::GraphClient;

use super::edges::Resolver;
use super::keys::KeyIndex;
use super::nodes::load_nodes_from_file;
use super::report::{LoadSummary, StepStatus};
use crate::config::LoaderConfig;
use crate::error::{VidgraphError, VidgraphResult};
use crate::model::{EntityKind, RelationKind};
use crate::schema::declare_schema;

/// Location of every source file a full load reads
#[derive(Debug, Clone)]
pub struct DataSources {
    pub nodes: BTreeMap<EntityKind, PathBuf>,
    pub relations: BTreeMap<RelationKind, PathBuf>,
}

impl DataSources {
    /// Standard layout: `<dir>/nodes/<entity>.csv` and `<dir>/edges/<relation>.csv`
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let nodes = EntityKind::ALL
            .iter()
            .map(|e| (*e, dir.join("nodes").join(e.file_name())))
            .collect();
        let relations = RelationKind::ALL
            .iter()
            .map(|r| (*r, dir.join("edges").join(r.file_name())))
            .collect();
        Self { nodes, relations }
    }

    pub fn with_node_file(mut self, entity: EntityKind, path: impl Into<PathBuf>) -> Self {
        self.nodes.insert(entity, path.into());
        self
    }

    pub fn with_relation_file(mut self, relation: RelationKind, path: impl Into<PathBuf>) -> Self {
        self.relations.insert(relation, path.into());
        self
    }

    /// Expected files that are not on disk
    pub fn missing(&self) -> Vec<PathBuf> {
        self.nodes
            .values()
            .chain(self.relations.values())
            .filter(|p| !p.is_file())
            .cloned()
            .collect()
    }
}

/// Load all node types, then all relationship types.
///
/// Returns `MissingSources` before touching the engine if any file is
/// absent. Otherwise every step runs: a failed step is recorded in the
/// summary and the load moves on to the next one.
pub async fn run_full_load<C>(
    client: &C,
    sources: &DataSources,
    config: &LoaderConfig,
) -> VidgraphResult<LoadSummary>
where
    C: GraphClient + ?Sized,
{
    let missing = sources.missing();
    if !missing.is_empty() {
        return Err(VidgraphError::MissingSources(missing));
    }

    if config.declare_schema {
        if let Err(e) = declare_schema(client, &config.retry).await {
            warn!("{}", e);
        }
    }

    let mut summary = LoadSummary::default();
    let mut keys = KeyIndex::new();

    for entity in EntityKind::ALL {
        let Some(path) = sources.nodes.get(&entity) else {
            continue;
        };
        info!("Loading {} nodes from {}", entity, path.display());
        match load_nodes_from_file(client, entity, path, &config.retry).await {
            Ok(report) => {
                keys.record(&report);
                summary.nodes.push((entity, StepStatus::Loaded(report)));
            }
            Err(e) => {
                warn!("Loading {} nodes failed: {}", entity, e);
                summary.nodes.push((entity, StepStatus::Failed(e.to_string())));
            }
        }
    }

    let resolver = Resolver::new(client, config).with_keys(&keys);
    for relation in RelationKind::ALL {
        let Some(path) = sources.relations.get(&relation) else {
            continue;
        };
        info!("Loading {} from {}", relation, path.display());
        match resolver.load_relationship_from_file(relation, path).await {
            Ok(report) => summary.relations.push((relation, StepStatus::Loaded(report))),
            Err(e) => {
                warn!("Loading {} failed: {}", relation, e);
                summary.relations.push((relation, StepStatus::Failed(e.to_string())));
            }
        }
    }

    info!(
        "Load complete: {} nodes, {} edges, {} failed steps",
        summary.nodes_created(),
        summary.edges_linked(),
        summary.failed_steps()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dir_maps_fixed_names() {
        let sources = DataSources::from_dir("data");
        assert_eq!(sources.nodes.len(), 4);
        assert_eq!(sources.relations.len(), 9);
        assert_eq!(sources.nodes[&EntityKind::User], PathBuf::from("data/nodes/users.csv"));
        assert_eq!(
            sources.relations[&RelationKind::UserPostsVideo],
            PathBuf::from("data/edges/user_posts_video.csv")
        );
    }

    #[test]
    fn test_missing_lists_absent_files() {
        let dir = tempfile::tempdir().unwrap();
        let sources = DataSources::from_dir(dir.path());
        assert_eq!(sources.missing().len(), 13);
    }
}
