//! Run-scoped natural-key index
//!
//! Filled from node batches as they load; lets relationship resolution
//! skip the lookup round-trip for nodes created in the same run.

use std::collections::HashMap;
use vidgraph_sdk::Uid;

use super::report::NodeLoadReport;
use crate::model::EntityKind;

#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    entries: HashMap<(EntityKind, String), Vec<Uid>>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityKind, key: &str, uid: Uid) {
        self.entries
            .entry((entity, key.to_string()))
            .or_default()
            .push(uid);
    }

    /// Record every node of a finished batch
    pub fn record(&mut self, report: &NodeLoadReport) {
        for (key, uid) in &report.keys {
            self.insert(report.entity, key, *uid);
        }
    }

    /// All uids created for `key`, in creation order
    pub fn get(&self, entity: EntityKind, key: &str) -> Option<&[Uid]> {
        self.entries
            .get(&(entity, key.to_string()))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keys_keep_every_uid() {
        let mut index = KeyIndex::new();
        index.insert(EntityKind::Video, "Intro", Uid::new(1));
        index.insert(EntityKind::Video, "Intro", Uid::new(7));
        index.insert(EntityKind::Playlist, "Intro", Uid::new(9));

        assert_eq!(index.get(EntityKind::Video, "Intro"), Some(&[Uid::new(1), Uid::new(7)][..]));
        assert_eq!(index.get(EntityKind::Playlist, "Intro"), Some(&[Uid::new(9)][..]));
        assert!(index.get(EntityKind::User, "Intro").is_none());
    }
}
