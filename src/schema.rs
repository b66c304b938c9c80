//! Schema manager: declares node types, predicates and indexes

use tracing::info;
use vidgraph_sdk::{
    GraphClient, Operation, PredicateSchema, Schema, Tokenizer, TypeSchema, ValueType,
};

use crate::config::RetryPolicy;
use crate::error::{VidgraphError, VidgraphResult};
use crate::retry::with_retry;

/// The video-platform schema.
///
/// ```text
///      |------v
///      |--- User --- likes / saves / posts ---> Video
///             ||--- creates ---> Playlist --- contains ---^
///             vv                                          |
///         |--> Comment --- replies_to --------------------|
///         |            |
///         |-replies_to-|
/// ```
pub fn video_platform_schema() -> Schema {
    use ValueType::*;

    Schema::new()
        .with_type(TypeSchema::new("Comment", &["text", "replies_to_c_c", "replies_to_c_v"]))
        .with_type(TypeSchema::new("Playlist", &["title", "visibility", "contains"]))
        .with_type(TypeSchema::new(
            "User",
            &[
                "username", "email", "location", "likes_u_c", "likes_u_v", "comments", "creates",
                "saves", "posts",
            ],
        ))
        .with_type(TypeSchema::new(
            "Video",
            &["title", "description", "duration", "date_uploaded"],
        ))
        .with_predicate(PredicateSchema::scalar("text", String).index(Tokenizer::Fulltext))
        .with_predicate(PredicateSchema::scalar("title", String).index(Tokenizer::Term))
        .with_predicate(PredicateSchema::scalar("visibility", String).index(Tokenizer::Term))
        .with_predicate(PredicateSchema::scalar("username", String).index(Tokenizer::Term))
        .with_predicate(PredicateSchema::scalar("email", String).index(Tokenizer::Term))
        .with_predicate(PredicateSchema::scalar("location", Geo).index(Tokenizer::Geo))
        .with_predicate(PredicateSchema::scalar("description", String))
        .with_predicate(PredicateSchema::scalar("duration", Int).index(Tokenizer::Int))
        .with_predicate(PredicateSchema::scalar("date_uploaded", DateTime).index(Tokenizer::Hour))
        .with_predicate(PredicateSchema::edge("comments").reverse())
        .with_predicate(PredicateSchema::edge("likes_u_c").reverse())
        .with_predicate(PredicateSchema::edge("likes_u_v").reverse())
        .with_predicate(PredicateSchema::edge("posts").reverse())
        .with_predicate(PredicateSchema::edge("saves"))
        .with_predicate(PredicateSchema::edge("creates").reverse())
        .with_predicate(PredicateSchema::edge("contains"))
        .with_predicate(PredicateSchema::edge("replies_to_c_c").reverse())
        .with_predicate(PredicateSchema::edge("replies_to_c_v").reverse())
}

/// Declare the schema. Re-declaring an existing schema is harmless;
/// callers treat a failure here as a warning, not a fatal error.
pub async fn declare_schema<C>(client: &C, retry: &RetryPolicy) -> VidgraphResult<()>
where
    C: GraphClient + ?Sized,
{
    let schema = video_platform_schema();
    with_retry(retry, "schema declaration", || {
        client.alter(Operation::Schema(schema.clone()))
    })
    .await
    .map_err(VidgraphError::SchemaDeclaration)?;
    info!("Schema declared ({} predicates)", schema.predicates.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, RelationKind};

    #[test]
    fn test_every_lookup_key_is_indexed() {
        let schema = video_platform_schema();
        for entity in EntityKind::ALL {
            let p = schema.predicate(entity.key_predicate()).unwrap();
            assert!(p.is_indexed(), "{} is not indexed", p.name);
        }
        assert!(schema.predicate("text").unwrap().has_index(Tokenizer::Fulltext));
    }

    #[test]
    fn test_every_relation_predicate_is_declared() {
        let schema = video_platform_schema();
        for relation in RelationKind::ALL {
            let p = schema.predicate(relation.predicate()).unwrap();
            assert_eq!(p.value_type, ValueType::Uid);
        }
        for reversible in ["comments", "likes_u_c", "likes_u_v", "posts", "creates", "replies_to_c_c", "replies_to_c_v"] {
            assert!(schema.predicate(reversible).unwrap().reverse, "{} lacks @reverse", reversible);
        }
    }

    #[tokio::test]
    async fn test_declare_is_idempotent() {
        let client = vidgraph_sdk::EmbeddedClient::new();
        declare_schema(&client, &RetryPolicy::default()).await.unwrap();
        declare_schema(&client, &RetryPolicy::default()).await.unwrap();
        let schema = client.schema().await.unwrap();
        assert_eq!(schema.predicates.len(), video_platform_schema().predicates.len());
    }
}
