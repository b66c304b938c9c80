mod common;

use common::{fast_config, loaded_client, Fixture};
use vidgraph::queries::{self, Page, SortDirection};
use vidgraph::{declare_schema, drop_all, run_full_load, EntityKind, RetryPolicy, VidgraphError};
use vidgraph_sdk::EmbeddedClient;

async fn client_with_videos(rows: &[(&str, i64)]) -> EmbeddedClient {
    let client = EmbeddedClient::new();
    let fixture = Fixture::empty();
    let mut body = String::from("title,description,duration,date_uploaded\n");
    for (title, duration) in rows {
        body.push_str(&format!("{},desc,{},2024-01-01T00:00:00Z\n", title, duration));
    }
    fixture.nodes(EntityKind::Video, &body);
    run_full_load(&client, &fixture.sources(), &fast_config()).await.unwrap();
    client
}

fn titles<T>(rows: &[T], title: impl Fn(&T) -> &str) -> Vec<String> {
    rows.iter().map(|r| title(r).to_string()).collect()
}

#[tokio::test]
async fn test_duration_threshold_is_strict() {
    let client = client_with_videos(&[("A", 5), ("B", 15), ("C", 25), ("D", 10)]).await;

    let rows = queries::videos_longer_than(&client, 10).await.unwrap();
    let mut got = titles(&rows, |v| &v.title);
    got.sort();
    assert_eq!(got, vec!["B", "C"]);
    assert!(rows.iter().all(|v| v.duration.unwrap() > 10));
}

#[tokio::test]
async fn test_paging_by_title() {
    let client = client_with_videos(&[("E", 1), ("C", 2), ("A", 3), ("D", 4), ("B", 5)]).await;

    let rows = queries::videos_page(&client, Page::new(2, 2)).await.unwrap();
    assert_eq!(titles(&rows, |v| &v.title), vec!["C", "D"]);

    let rows = queries::videos_page(&client, Page::parse("x", "1")).await.unwrap();
    assert_eq!(titles(&rows, |v| &v.title), vec!["A", "B"]);

    let rows = queries::videos_page(&client, Page::new(2, 10)).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_sorted_by_duration_both_ways() {
    let client = client_with_videos(&[("A", 15), ("B", 5), ("C", 25)]).await;

    let asc = queries::videos_sorted(&client, SortDirection::parse("asc")).await.unwrap();
    assert_eq!(titles(&asc, |v| &v.title), vec!["B", "A", "C"]);

    let desc = queries::videos_sorted(&client, SortDirection::parse("anything")).await.unwrap();
    assert_eq!(titles(&desc, |v| &v.title), vec!["C", "A", "B"]);
}

#[tokio::test]
async fn test_video_count() {
    let client = client_with_videos(&[("A", 1), ("B", 2), ("C", 3)]).await;
    assert_eq!(queries::video_count(&client).await.unwrap(), 3);
}

#[tokio::test]
async fn test_text_search_matches_any_term() {
    let client = loaded_client().await;

    let hits = queries::text_search(&client, "video sharing").await.unwrap();
    let mut got = titles(&hits, |c| &c.text);
    got.sort();
    assert_eq!(got, vec!["great video", "thanks for sharing"]);

    assert!(queries::text_search(&client, "nothing here").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_terms_are_escaped() {
    let client = loaded_client().await;
    let hits = queries::text_search(&client, r#"great") { uid } } { all(func: has(text)"#)
        .await
        .unwrap();
    assert_eq!(titles(&hits, |c| &c.text), vec!["great video"]);
}

#[tokio::test]
async fn test_users_with_posts_includes_users_without_posts() {
    let client = loaded_client().await;

    let users = queries::users_with_posts(&client).await.unwrap();
    assert_eq!(users.len(), 3);

    let ana = users.iter().find(|u| u.username == "ana").unwrap();
    let mut posted = titles(&ana.posts, |v| &v.title);
    posted.sort();
    assert_eq!(posted, vec!["Async Deep Dive", "Intro to Rust"]);

    let cleo = users.iter().find(|u| u.username == "cleo").unwrap();
    assert!(cleo.posts.is_empty());
}

#[tokio::test]
async fn test_video_posters_follow_reverse_edge() {
    let client = loaded_client().await;

    let rows = queries::video_posters(&client, "Graph Databases").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(titles(&rows[0].posters, |u| &u.username), vec!["ben"]);

    assert!(queries::video_posters(&client, "Missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_drop_all_then_count() {
    let client = loaded_client().await;

    drop_all(&client).await.unwrap();
    assert_eq!(client.node_count().await, 0);

    // without a schema, indexed lookups fail cleanly
    let err = queries::videos_longer_than(&client, 1).await.unwrap_err();
    assert!(matches!(err, VidgraphError::Query(_)));

    declare_schema(&client, &RetryPolicy::default()).await.unwrap();
    assert_eq!(queries::video_count(&client).await.unwrap(), 0);
}
