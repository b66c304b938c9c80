//! Read-only queries over the committed graph
//!
//! Each query opens its own read-only transaction, escapes every string
//! parameter through the DQL builder and decodes the result block into
//! typed rows.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vidgraph_sdk::dql::{Block, Direction, Field, Func, Query};
use vidgraph_sdk::{GraphClient, Uid};

use crate::error::{VidgraphError, VidgraphResult};
use crate::txn;

/// A comment matched by full-text search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentHit {
    pub uid: Uid,
    #[serde(default)]
    pub text: String,
}

/// Video with its duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub uid: Uid,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

/// Video identified by title only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTitle {
    pub uid: Uid,
    #[serde(default)]
    pub title: String,
}

/// A user and the videos they posted; `posts` is empty for users who posted nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPosts {
    pub uid: Uid,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub posts: Vec<VideoSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub uid: Uid,
    #[serde(default)]
    pub username: String,
}

/// A video and the users whose `posts` edge points at it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPosters {
    pub uid: Uid,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "~posts", default)]
    pub posters: Vec<UserRef>,
}

/// Sort direction for duration-ordered listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `asc` (any case) is ascending; everything else is descending
    pub fn parse(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("asc") {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }

    fn direction(self) -> Direction {
        match self {
            SortDirection::Ascending => Direction::Asc,
            SortDirection::Descending => Direction::Desc,
        }
    }
}

/// Result window for paged listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub first: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { first: 2, offset: 0 }
    }
}

impl Page {
    pub fn new(first: u32, offset: u32) -> Self {
        Self { first, offset }
    }

    /// `None` unless both values are non-negative integers
    pub fn try_parse(first: &str, offset: &str) -> Option<Self> {
        let first = u32::from_str(first.trim()).ok()?;
        let offset = u32::from_str(offset.trim()).ok()?;
        Some(Self { first, offset })
    }

    /// Parse both values, falling back to the default page on bad input
    pub fn parse(first: &str, offset: &str) -> Self {
        Self::try_parse(first, offset).unwrap_or_default()
    }
}

fn video_fields() -> Vec<Field> {
    vec![Field::Uid, Field::scalar("title"), Field::scalar("duration")]
}

async fn fetch<C, T>(client: &C, block: Block) -> VidgraphResult<Vec<T>>
where
    C: GraphClient + ?Sized,
    T: DeserializeOwned,
{
    let name = block.name.clone();
    let query = Query::new(block);
    let data = txn::read(client, &query)
        .await
        .map_err(VidgraphError::from_query)?;
    match data.get(&name) {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(rows) => serde_json::from_value(rows.clone())
            .map_err(|e| VidgraphError::Response(format!("{}: {}", name, e))),
    }
}

/// Comments whose text contains any term of `term`
pub async fn text_search<C>(client: &C, term: &str) -> VidgraphResult<Vec<CommentHit>>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("comments", Func::any_of_text("text", term))
        .fields([Field::Uid, Field::scalar("text")]);
    fetch(client, block).await
}

/// Videos strictly longer than `threshold`
pub async fn videos_longer_than<C>(client: &C, threshold: i64) -> VidgraphResult<Vec<VideoSummary>>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("long_videos", Func::gt("duration", threshold)).fields(video_fields());
    fetch(client, block).await
}

/// Every user with the videos they posted
pub async fn users_with_posts<C>(client: &C) -> VidgraphResult<Vec<UserPosts>>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("users_with_posts", Func::of_type("User")).fields([
        Field::Uid,
        Field::scalar("username"),
        Field::edge("posts", video_fields()),
    ]);
    fetch(client, block).await
}

/// Videos titled exactly `title`, with the users who posted them
pub async fn video_posters<C>(client: &C, title: &str) -> VidgraphResult<Vec<VideoPosters>>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("video_posters", Func::eq("title", title))
        .filter(Func::of_type("Video"))
        .fields([
            Field::Uid,
            Field::scalar("title"),
            Field::reverse_edge("posts", vec![Field::Uid, Field::scalar("username")]),
        ]);
    fetch(client, block).await
}

/// All videos ordered by duration
pub async fn videos_sorted<C>(client: &C, direction: SortDirection) -> VidgraphResult<Vec<VideoSummary>>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("videos_sorted", Func::of_type("Video"))
        .order_by("duration", direction.direction())
        .fields(video_fields());
    fetch(client, block).await
}

#[derive(Deserialize)]
struct CountRow {
    #[serde(default)]
    count: u64,
}

/// Number of Video nodes
pub async fn video_count<C>(client: &C) -> VidgraphResult<u64>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("video_count", Func::of_type("Video")).field(Field::count("count"));
    let rows: Vec<CountRow> = fetch(client, block).await?;
    Ok(rows.first().map(|r| r.count).unwrap_or(0))
}

/// One page of videos ordered by title
pub async fn videos_page<C>(client: &C, page: Page) -> VidgraphResult<Vec<VideoTitle>>
where
    C: GraphClient + ?Sized,
{
    let block = Block::new("paged_videos", Func::of_type("Video"))
        .order_by("title", Direction::Asc)
        .first(i64::from(page.first))
        .offset(i64::from(page.offset))
        .fields([Field::Uid, Field::scalar("title")]);
    fetch(client, block).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_direction_defaults_to_descending() {
        assert_eq!(SortDirection::parse("asc"), SortDirection::Ascending);
        assert_eq!(SortDirection::parse(" ASC "), SortDirection::Ascending);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Descending);
        assert_eq!(SortDirection::parse("ascending"), SortDirection::Descending);
        assert_eq!(SortDirection::parse(""), SortDirection::Descending);
    }

    #[test]
    fn test_page_parse_falls_back_on_bad_input() {
        assert_eq!(Page::parse("3", "4"), Page::new(3, 4));
        assert_eq!(Page::parse(" 2", "2 "), Page::new(2, 2));
        assert_eq!(Page::parse("two", "0"), Page::default());
        assert_eq!(Page::parse("5", "-1"), Page::default());
        assert_eq!(Page::parse("", ""), Page::new(2, 0));
        assert!(Page::try_parse("1", "x").is_none());
    }

    #[test]
    fn test_video_posters_decodes_reverse_edge() {
        let rows: Vec<VideoPosters> = serde_json::from_value(serde_json::json!([
            {"uid": "0x5", "title": "Intro", "~posts": [{"uid": "0x1", "username": "ana"}]},
            {"uid": "0x6", "title": "Intro"}
        ]))
        .unwrap();
        assert_eq!(rows[0].posters[0].username, "ana");
        assert!(rows[1].posters.is_empty());
    }
}
