//! vidgraph: video-platform graph loader and query service for Dgraph
//!
//! Loads users, videos, comments and playlists from CSV files into a
//! Dgraph instance, links them with nine relationship kinds, and runs a
//! fixed set of read queries and deletes over the result.
//!
//! # Layers
//!
//! - `schema`: the predicate/type declaration, idempotent to re-apply
//! - `loader`: node batches, relationship resolution, full-load orchestration
//! - `queries`: read-only listings and searches with typed results
//! - `delete`: delete-by-term and drop-all
//!
//! All engine access goes through the `vidgraph_sdk::GraphClient` trait,
//! so everything here runs unchanged against a remote alpha or the
//! in-process `EmbeddedClient`.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use vidgraph::{run_full_load, DataSources, LoaderConfig};
//! use vidgraph_sdk::RemoteClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RemoteClient::new("http://localhost:8080");
//!     let summary = run_full_load(&client, &DataSources::from_dir("data"), &LoaderConfig::default()).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod delete;
pub mod error;
pub mod loader;
pub mod model;
pub mod queries;
pub mod retry;
pub mod schema;
pub mod source;
pub mod txn;

pub use config::{AmbiguityPolicy, AppConfig, LoaderConfig, ResolutionStrategy, RetryPolicy};
pub use delete::{delete_comments_matching, drop_all, DeleteOutcome};
pub use error::{VidgraphError, VidgraphResult};
pub use loader::{
    run_full_load, DataSources, KeyIndex, LoadReport, LoadSummary, NodeLoadReport, Resolver,
    RowOutcome, Side, StepStatus,
};
pub use model::{EntityKind, RelationKind};
pub use queries::{
    CommentHit, Page, SortDirection, UserPosts, UserRef, VideoPosters, VideoSummary, VideoTitle,
};
pub use schema::{declare_schema, video_platform_schema};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
