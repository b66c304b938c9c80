//! vidgraph SDK: client contract for the Dgraph engine behind vidgraph
//!
//! Provides two client implementations:
//!
//! - **`EmbeddedClient`**: In-process engine, no network. Implements the
//!   DQL subset vidgraph uses. Ideal for tests and offline demos.
//!
//! - **`RemoteClient`**: Connects to a running Dgraph alpha via HTTP.
//!
//! Both implement the `GraphClient` trait, which hands out `Transaction`s.
//! Queries and schemas are built as typed values (`dql`, `schema`) and
//! rendered to text only at the transport boundary.
//!
//! # Quick Start
//!
//! ```rust
//! use vidgraph_sdk::{EmbeddedClient, GraphClient, Mutation, TxnMode};
//! use vidgraph_sdk::dql::{Block, Field, Func, Query};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = EmbeddedClient::new();
//!
//!     let mut txn = client.txn(TxnMode::ReadWrite);
//!     txn.mutate(&Mutation::set(vec![
//!         serde_json::json!({"uid": "_:v1", "dgraph.type": "Video", "title": "Intro"}),
//!     ])).await.unwrap();
//!     txn.commit().await.unwrap();
//!
//!     let mut txn = client.txn(TxnMode::ReadOnly);
//!     let data = txn.query(&Query::new(
//!         Block::new("videos", Func::of_type("Video")).field(Field::scalar("title")),
//!     )).await.unwrap();
//!     println!("{}", data["videos"]);
//! }
//! ```

pub mod client;
pub mod dql;
pub mod embedded;
pub mod error;
pub mod models;
pub mod remote;
pub mod schema;

pub use client::{GraphClient, Transaction};
pub use embedded::EmbeddedClient;
pub use error::{SdkError, SdkResult};
pub use models::{Mutation, MutationResponse, Operation, TxnMode, Uid};
pub use remote::RemoteClient;
pub use schema::{PredicateSchema, Schema, Tokenizer, TypeSchema, ValueType};
