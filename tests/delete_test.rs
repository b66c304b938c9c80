mod common;

use common::{fast_config, loaded_client, Fixture};
use vidgraph::queries;
use vidgraph::{delete_comments_matching, run_full_load, DeleteOutcome, EntityKind};
use vidgraph_sdk::EmbeddedClient;

#[tokio::test]
async fn test_delete_removes_every_matching_comment() {
    let client = EmbeddedClient::new();
    let fixture = Fixture::empty();
    fixture.nodes(EntityKind::Comment, "text\nhello world\nhello there\ngoodbye\n");
    run_full_load(&client, &fixture.sources(), &fast_config()).await.unwrap();

    let outcome = delete_comments_matching(&client, "hello").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted(2));
    assert_eq!(outcome.count(), 2);

    let left = queries::text_search(&client, "hello goodbye").await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].text, "goodbye");
}

#[tokio::test]
async fn test_delete_with_no_match() {
    let client = loaded_client().await;
    let before = client.node_count().await;

    let outcome = delete_comments_matching(&client, "zebra").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::NothingMatched);
    assert_eq!(outcome.count(), 0);
    assert_eq!(client.node_count().await, before);
}

#[tokio::test]
async fn test_delete_leaves_other_comments() {
    let client = loaded_client().await;

    let outcome = delete_comments_matching(&client, "great").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted(1));

    let replies = queries::text_search(&client, "sharing").await.unwrap();
    assert_eq!(replies.len(), 1);
    assert!(queries::text_search(&client, "great").await.unwrap().is_empty());
}
