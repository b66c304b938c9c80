//! Outcomes of node and relationship load steps

use std::collections::BTreeMap;
use std::fmt;
use vidgraph_sdk::Uid;

use crate::model::{EntityKind, RelationKind};

/// Result of one node batch
#[derive(Debug, Clone)]
pub struct NodeLoadReport {
    pub entity: EntityKind,
    /// Batch-scoped blank-node name (`u1`, `v2`, ...) to assigned uid
    pub uids: BTreeMap<String, Uid>,
    /// Natural key of each created node, in row order
    pub keys: Vec<(String, Uid)>,
}

impl NodeLoadReport {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            uids: BTreeMap::new(),
            keys: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }
}

/// Which end of a relationship row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Target => f.write_str("target"),
        }
    }
}

/// What happened to one relationship row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Edge written and committed
    Linked,
    /// An endpoint matched no node; row skipped
    Unresolved { side: Side, key: String },
    /// An endpoint matched several nodes and the policy rejects ambiguity
    Ambiguous { side: Side, key: String, matches: usize },
    /// Same edge already written earlier in this load
    Duplicate,
    /// Lookup or write failed
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    /// 1-based data row number in the source file
    pub row: usize,
    pub outcome: RowOutcome,
}

/// Result of one relationship step
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub relation: RelationKind,
    pub rows: Vec<RowReport>,
    /// Rows linked through the first of several matches
    pub first_match_fallbacks: usize,
}

impl LoadReport {
    pub fn new(relation: RelationKind) -> Self {
        Self {
            relation,
            rows: Vec::new(),
            first_match_fallbacks: 0,
        }
    }

    pub(crate) fn record(&mut self, row: usize, outcome: RowOutcome) {
        self.rows.push(RowReport { row, outcome });
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn linked(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Linked))
    }

    pub fn unresolved(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Unresolved { .. }))
    }

    pub fn ambiguous(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Ambiguous { .. }))
    }

    pub fn duplicates(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Duplicate))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed { .. }))
    }

    pub fn outcome(&self, row: usize) -> Option<&RowOutcome> {
        self.rows.iter().find(|r| r.row == row).map(|r| &r.outcome)
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} linked, {} unresolved, {} ambiguous, {} duplicate, {} failed",
            self.relation,
            self.linked(),
            self.unresolved(),
            self.ambiguous(),
            self.duplicates(),
            self.failed()
        )
    }
}

/// Status of a single load step
#[derive(Debug, Clone)]
pub enum StepStatus<R> {
    Loaded(R),
    Failed(String),
}

impl<R> StepStatus<R> {
    pub fn report(&self) -> Option<&R> {
        match self {
            StepStatus::Loaded(r) => Some(r),
            StepStatus::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepStatus::Failed(_))
    }
}

/// Every step of a completed full load
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub nodes: Vec<(EntityKind, StepStatus<NodeLoadReport>)>,
    pub relations: Vec<(RelationKind, StepStatus<LoadReport>)>,
}

impl LoadSummary {
    pub fn node_step(&self, entity: EntityKind) -> Option<&StepStatus<NodeLoadReport>> {
        self.nodes.iter().find(|(e, _)| *e == entity).map(|(_, s)| s)
    }

    pub fn relation_step(&self, relation: RelationKind) -> Option<&StepStatus<LoadReport>> {
        self.relations.iter().find(|(r, _)| *r == relation).map(|(_, s)| s)
    }

    pub fn failed_steps(&self) -> usize {
        self.nodes.iter().filter(|(_, s)| s.is_failed()).count()
            + self.relations.iter().filter(|(_, s)| s.is_failed()).count()
    }

    pub fn nodes_created(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|(_, s)| s.report())
            .map(NodeLoadReport::len)
            .sum()
    }

    pub fn edges_linked(&self) -> usize {
        self.relations
            .iter()
            .filter_map(|(_, s)| s.report())
            .map(LoadReport::linked)
            .sum()
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (entity, status) in &self.nodes {
            match status {
                StepStatus::Loaded(r) => writeln!(f, "  {:<10} {} nodes", entity.type_name(), r.len())?,
                StepStatus::Failed(e) => writeln!(f, "  {:<10} FAILED: {}", entity.type_name(), e)?,
            }
        }
        for (relation, status) in &self.relations {
            match status {
                StepStatus::Loaded(r) => writeln!(f, "  {}", r)?,
                StepStatus::Failed(e) => writeln!(f, "  {}: FAILED: {}", relation, e)?,
            }
        }
        write!(
            f,
            "{} nodes created, {} edges linked, {} failed steps",
            self.nodes_created(),
            self.edges_linked(),
            self.failed_steps()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = LoadReport::new(RelationKind::UserPostsVideo);
        report.record(1, RowOutcome::Linked);
        report.record(2, RowOutcome::Unresolved { side: Side::Target, key: "Nope".into() });
        report.record(3, RowOutcome::Duplicate);
        report.record(4, RowOutcome::Linked);
        assert_eq!(report.linked(), 2);
        assert_eq!(report.unresolved(), 1);
        assert_eq!(report.duplicates(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.outcome(3), Some(&RowOutcome::Duplicate));
        assert_eq!(
            report.to_string(),
            "User -[posts]-> Video: 2 linked, 1 unresolved, 0 ambiguous, 1 duplicate, 0 failed"
        );
    }
}
