#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vidgraph::{DataSources, EntityKind, LoaderConfig, RelationKind, RetryPolicy};
use vidgraph_sdk::EmbeddedClient;

pub const USERS: &str = "username,email,location.lat,location.long
ana,ana@example.com,40.41,-3.70
ben,ben@example.com,51.50,-0.12
cleo,cleo@example.com,48.85,2.35
";

pub const VIDEOS: &str = "title,description,duration,date_uploaded
Intro to Rust,Ownership and borrowing,5,2024-01-10T10:00:00Z
Async Deep Dive,Futures and executors,15,2024-02-11T10:00:00Z
Graph Databases,Nodes edges and predicates,25,2024-03-12T10:00:00Z
";

pub const PLAYLISTS: &str = "title,visibility
Learning,public
Favourites,private
";

pub const COMMENTS: &str = "text
great video
thanks for sharing
loved the async part
";

/// Data directory in a temp dir with every source file present
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    /// Every file present, headers only
    pub fn empty() -> Self {
        let fixture = Fixture {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(fixture.dir.path().join("nodes")).unwrap();
        fs::create_dir_all(fixture.dir.path().join("edges")).unwrap();
        for entity in EntityKind::ALL {
            fixture.nodes(entity, &format!("{}\n", entity.required_columns().join(",")));
        }
        for relation in RelationKind::ALL {
            fixture.edges(relation, &format!("{}\n", relation.required_columns().join(",")));
        }
        fixture
    }

    /// Three users, three videos, two playlists, three comments and fourteen edges
    pub fn standard() -> Self {
        let fixture = Self::empty();
        fixture.nodes(EntityKind::User, USERS);
        fixture.nodes(EntityKind::Video, VIDEOS);
        fixture.nodes(EntityKind::Playlist, PLAYLISTS);
        fixture.nodes(EntityKind::Comment, COMMENTS);
        fixture.edges(
            RelationKind::UserPostsVideo,
            "username,title\nana,Intro to Rust\nana,Async Deep Dive\nben,Graph Databases\n",
        );
        fixture.edges(
            RelationKind::UserComments,
            "username,comment_text\nben,great video\ncleo,thanks for sharing\n",
        );
        fixture.edges(RelationKind::UserLikesVideo, "username,title\ncleo,Intro to Rust\n");
        fixture.edges(RelationKind::UserLikesComment, "username,comment_text\nana,great video\n");
        fixture.edges(RelationKind::UserSavesVideo, "username,title\ncleo,Graph Databases\n");
        fixture.edges(
            RelationKind::UserCreatesPlaylist,
            "username,title\nana,Learning\ncleo,Favourites\n",
        );
        fixture.edges(
            RelationKind::PlaylistContainsVideo,
            "playlist_title,video_title\nLearning,Intro to Rust\nLearning,Async Deep Dive\n",
        );
        fixture.edges(
            RelationKind::CommentRepliesVideo,
            "comment_text,video_title\ngreat video,Intro to Rust\n",
        );
        fixture.edges(
            RelationKind::CommentRepliesComment,
            "comment_text,replied_to_text\nthanks for sharing,great video\n",
        );
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn node_path(&self, entity: EntityKind) -> PathBuf {
        self.path().join("nodes").join(entity.file_name())
    }

    pub fn edge_path(&self, relation: RelationKind) -> PathBuf {
        self.path().join("edges").join(relation.file_name())
    }

    pub fn nodes(&self, entity: EntityKind, body: &str) {
        fs::write(self.node_path(entity), body).unwrap();
    }

    pub fn edges(&self, relation: RelationKind, body: &str) {
        fs::write(self.edge_path(relation), body).unwrap();
    }

    pub fn sources(&self) -> DataSources {
        DataSources::from_dir(self.path())
    }
}

/// Config with short backoff so retry tests stay fast
pub fn fast_config() -> LoaderConfig {
    LoaderConfig {
        retry: RetryPolicy {
            max_attempts: 1,
            initial_backoff_ms: 2,
            max_backoff_ms: 4,
        },
        ..LoaderConfig::default()
    }
}

/// Embedded engine with the standard dataset loaded
pub async fn loaded_client() -> EmbeddedClient {
    let client = EmbeddedClient::new();
    let fixture = Fixture::standard();
    let summary = vidgraph::run_full_load(&client, &fixture.sources(), &fast_config())
        .await
        .unwrap();
    assert_eq!(summary.failed_steps(), 0);
    client
}
