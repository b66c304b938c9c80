//! Bulk loading of nodes and relationships from tabular sources

pub mod edges;
pub mod keys;
pub mod nodes;
pub mod orchestrator;
pub mod report;

pub use edges::{lookup_query, Resolver};
pub use keys::KeyIndex;
pub use nodes::{load_nodes, load_nodes_from_file};
pub use orchestrator::{run_full_load, DataSources};
pub use report::{
    LoadReport, LoadSummary, NodeLoadReport, RowOutcome, RowReport, Side, StepStatus,
};
