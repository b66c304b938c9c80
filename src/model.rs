//! Entity and relationship catalogue of the video-platform graph
//!
//! Node types, their source files and columns, the natural key used to
//! find each node again, and the nine relationship kinds with the
//! endpoint columns and predicate each one writes.

use std::fmt;

/// Graph node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Comment,
    Playlist,
    User,
    Video,
}

/// How an entity is found from its natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// `eq(predicate, key)`
    Exact,
    /// `anyoftext(predicate, key)`
    FullText,
}

impl EntityKind {
    /// Load order of node batches
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Comment,
        EntityKind::Playlist,
        EntityKind::User,
        EntityKind::Video,
    ];

    /// `dgraph.type` value
    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::Comment => "Comment",
            EntityKind::Playlist => "Playlist",
            EntityKind::User => "User",
            EntityKind::Video => "Video",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            EntityKind::Comment => "comments.csv",
            EntityKind::Playlist => "playlists.csv",
            EntityKind::User => "users.csv",
            EntityKind::Video => "videos.csv",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Comment => &["text"],
            EntityKind::Playlist => &["title", "visibility"],
            EntityKind::User => &["username", "email", "location.lat", "location.long"],
            EntityKind::Video => &["title", "description", "duration", "date_uploaded"],
        }
    }

    /// Predicate holding the natural key
    pub fn key_predicate(&self) -> &'static str {
        match self {
            EntityKind::Comment => "text",
            EntityKind::Playlist | EntityKind::Video => "title",
            EntityKind::User => "username",
        }
    }

    pub fn key_match(&self) -> KeyMatch {
        match self {
            EntityKind::Comment => KeyMatch::FullText,
            _ => KeyMatch::Exact,
        }
    }

    /// Prefix of the batch-scoped blank-node names (`u1`, `v2`, ...)
    pub fn blank_prefix(&self) -> &'static str {
        match self {
            EntityKind::Comment => "c",
            EntityKind::Playlist => "p",
            EntityKind::User => "u",
            EntityKind::Video => "v",
        }
    }

    /// Lookup block name, also the key of the result array
    pub fn lookup_name(&self) -> &'static str {
        match self {
            EntityKind::Comment => "comment",
            EntityKind::Playlist => "playlist",
            EntityKind::User => "user",
            EntityKind::Video => "video",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One side of a relationship row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub entity: EntityKind,
    pub column: &'static str,
}

const fn endpoint(entity: EntityKind, column: &'static str) -> Endpoint {
    Endpoint { entity, column }
}

/// Relationship kinds; the edge is written on the source node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    CommentRepliesComment,
    CommentRepliesVideo,
    PlaylistContainsVideo,
    UserComments,
    UserCreatesPlaylist,
    UserLikesComment,
    UserLikesVideo,
    UserPostsVideo,
    UserSavesVideo,
}

impl RelationKind {
    /// Load order of relationship steps
    pub const ALL: [RelationKind; 9] = [
        RelationKind::CommentRepliesComment,
        RelationKind::CommentRepliesVideo,
        RelationKind::PlaylistContainsVideo,
        RelationKind::UserComments,
        RelationKind::UserCreatesPlaylist,
        RelationKind::UserLikesComment,
        RelationKind::UserLikesVideo,
        RelationKind::UserPostsVideo,
        RelationKind::UserSavesVideo,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            RelationKind::CommentRepliesComment => "comment_replies_comment.csv",
            RelationKind::CommentRepliesVideo => "comment_replies_video.csv",
            RelationKind::PlaylistContainsVideo => "playlist_contains_video.csv",
            RelationKind::UserComments => "user_comments.csv",
            RelationKind::UserCreatesPlaylist => "user_creates_playlist.csv",
            RelationKind::UserLikesComment => "user_likes_comment.csv",
            RelationKind::UserLikesVideo => "user_likes_video.csv",
            RelationKind::UserPostsVideo => "user_posts_video.csv",
            RelationKind::UserSavesVideo => "user_saves_video.csv",
        }
    }

    /// Edge predicate set on the source node
    pub fn predicate(&self) -> &'static str {
        match self {
            RelationKind::CommentRepliesComment => "replies_to_c_c",
            RelationKind::CommentRepliesVideo => "replies_to_c_v",
            RelationKind::PlaylistContainsVideo => "contains",
            RelationKind::UserComments => "comments",
            RelationKind::UserCreatesPlaylist => "creates",
            RelationKind::UserLikesComment => "likes_u_c",
            RelationKind::UserLikesVideo => "likes_u_v",
            RelationKind::UserPostsVideo => "posts",
            RelationKind::UserSavesVideo => "saves",
        }
    }

    pub fn source(&self) -> Endpoint {
        use EntityKind::*;
        match self {
            RelationKind::CommentRepliesComment => endpoint(Comment, "replied_to_text"),
            RelationKind::CommentRepliesVideo => endpoint(Comment, "comment_text"),
            RelationKind::PlaylistContainsVideo => endpoint(Playlist, "playlist_title"),
            RelationKind::UserComments
            | RelationKind::UserCreatesPlaylist
            | RelationKind::UserLikesComment
            | RelationKind::UserLikesVideo
            | RelationKind::UserPostsVideo
            | RelationKind::UserSavesVideo => endpoint(User, "username"),
        }
    }

    pub fn target(&self) -> Endpoint {
        use EntityKind::*;
        match self {
            RelationKind::CommentRepliesComment => endpoint(Comment, "comment_text"),
            RelationKind::CommentRepliesVideo => endpoint(Video, "video_title"),
            RelationKind::PlaylistContainsVideo => endpoint(Video, "video_title"),
            RelationKind::UserComments => endpoint(Comment, "comment_text"),
            RelationKind::UserCreatesPlaylist => endpoint(Playlist, "title"),
            RelationKind::UserLikesComment => endpoint(Comment, "comment_text"),
            RelationKind::UserLikesVideo
            | RelationKind::UserPostsVideo
            | RelationKind::UserSavesVideo => endpoint(Video, "title"),
        }
    }

    pub fn required_columns(&self) -> [&'static str; 2] {
        [self.source().column, self.target().column]
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.source().entity;
        let target = self.target().entity;
        write!(f, "{} -[{}]-> {}", source, self.predicate(), target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relations_only_reference_loaded_entities() {
        for relation in RelationKind::ALL {
            assert!(EntityKind::ALL.contains(&relation.source().entity));
            assert!(EntityKind::ALL.contains(&relation.target().entity));
            let [a, b] = relation.required_columns();
            assert_ne!(a, b, "{} uses one column twice", relation);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RelationKind::UserPostsVideo.to_string(), "User -[posts]-> Video");
    }
}
